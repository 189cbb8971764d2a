use std::path::{Component, Path, PathBuf};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Expresses `target` relative to the directory containing `link`.
///
/// Both paths are relative to the same repository root. This is what gets written into a symlink
/// so the link keeps resolving wherever the repository is mounted.
///
/// ## Example
/// ```
/// use std::path::{Path, PathBuf};
/// use podstore::utils::relative_symlink_target;
///
/// let target = relative_symlink_target(
///     Path::new("podmanStore/overlay/aa11/diff"),
///     Path::new("layers/aa/aa11/layerfs"),
/// );
/// assert_eq!(target, PathBuf::from("../../../layers/aa/aa11/layerfs"));
/// ```
pub fn relative_symlink_target(link: &Path, target: &Path) -> PathBuf {
    let base: Vec<Component> = link
        .parent()
        .map(|p| p.components().filter(is_normal).collect())
        .unwrap_or_default();
    let target_components: Vec<Component> = target.components().filter(is_normal).collect();

    let common = base
        .iter()
        .zip(target_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }

    for component in &target_components[common..] {
        relative.push(component.as_os_str());
    }

    relative
}

fn is_normal(component: &Component) -> bool {
    !matches!(component, Component::CurDir | Component::RootDir)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

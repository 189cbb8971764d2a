use rand::Rng;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The length of a link alias.
pub const LINK_ID_LENGTH: usize = 26;

/// The characters a link alias is drawn from.
pub const LINK_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Generates a random link alias.
///
/// Aliases stand in for layer ids in overlay mount options, which keeps those strings short.
/// Every call is an independent draw: nothing checks the result against aliases already issued.
pub fn generate_link_id() -> String {
    let mut rng = rand::rng();
    (0..LINK_ID_LENGTH)
        .map(|_| LINK_ID_CHARSET[rng.random_range(0..LINK_ID_CHARSET.len())] as char)
        .collect()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

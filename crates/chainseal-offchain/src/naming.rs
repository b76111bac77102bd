//! Object file naming

use rand::RngCore;

pub const FILE_PREFIX: &str = "offchain_";
pub const FILE_EXTENSION: &str = "dat";

/// `offchain_<unix millis>_<16 hex chars>.dat`
pub fn object_file_name() -> String {
    let mut suffix = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut suffix);
    format!(
        "{FILE_PREFIX}{}_{}.{FILE_EXTENSION}",
        chrono::Utc::now().timestamp_millis(),
        hex::encode(suffix)
    )
}

/// True for names produced by [`object_file_name`].
pub fn is_object_file_name(name: &str) -> bool {
    let Some(stem) = name
        .strip_prefix(FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(".dat"))
    else {
        return false;
    };
    let Some((timestamp, random)) = stem.split_once('_') else {
        return false;
    };
    !timestamp.is_empty()
        && timestamp.bytes().all(|b| b.is_ascii_digit())
        && random.len() == 16
        && random.bytes().all(|b| b.is_ascii_hexdigit())
}

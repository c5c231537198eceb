use crate::error::BuildError;

/// Splits a registry path on `/`, skipping empty segments.
pub fn registry_segments(registry_address: &str) -> Vec<&str> {
    registry_address
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// generate cache repository like `{first_segment}/cache`
pub fn derive_cache_address(registry_address: &str) -> Result<String, BuildError> {
    let segments = registry_segments(registry_address);

    match segments.first() {
        Some(head) => Ok(format!("{}/cache", head)),
        None => Err(BuildError::InvalidRegistryAddress(
            registry_address.to_string(),
        )),
    }
}

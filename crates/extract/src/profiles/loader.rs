// ABOUTME: Loads profile registries from the embedded builtin JSON or from caller-supplied JSON.
// ABOUTME: Provides load_builtin_registry() and load_registry_json() for overrides.

use crate::profiles::{Profile, ProfileRegistry};

/// Embedded JSON with the builtin immoscout and homegate profiles.
const BUILTIN_PROFILES_JSON: &str = include_str!("../../data/profiles.json");

/// Loads the builtin profile registry from embedded JSON.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed; it is validated by this module's tests.
pub fn load_builtin_registry() -> ProfileRegistry {
    let profiles: Vec<Profile> =
        serde_json::from_str(BUILTIN_PROFILES_JSON).expect("failed to parse builtin profiles");

    let mut registry = ProfileRegistry::new();
    for profile in profiles {
        registry.register(profile);
    }
    registry
}

/// Parses a JSON list of profiles and registers them on top of `base`, replacing
/// builtin profiles with the same id.
pub fn load_registry_json(
    base: ProfileRegistry,
    json: &str,
) -> Result<ProfileRegistry, serde_json::Error> {
    let profiles: Vec<Profile> = serde_json::from_str(json)?;
    let mut registry = base;
    for profile in profiles {
        registry.register(profile);
    }
    Ok(registry)
}

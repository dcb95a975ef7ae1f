use cm::{ModelOverrides, Profile, ProfileRegistry, Store};
use tempfile::TempDir;

/// Registry over a throwaway config directory. Keep the `TempDir` alive.
pub fn temp_registry() -> (TempDir, ProfileRegistry) {
    let dir = TempDir::new().expect("create temp dir");
    let registry = ProfileRegistry::new(Store::at(dir.path()));
    (dir, registry)
}

pub fn add_simple(registry: &ProfileRegistry, name: &str) -> Profile {
    registry
        .add_model(
            name,
            "tok-123",
            "https://api.example.com",
            None,
            ModelOverrides::default(),
        )
        .expect("add model")
}

use cm::{CmError, Launcher};

use super::common::{add_simple, temp_registry};

#[test]
fn missing_binary_is_not_found() {
    let (_dir, registry) = temp_registry();
    let profile = add_simple(&registry, "work");
    let err = Launcher::new("cm-integration-no-such-binary")
        .launch(&profile, &["--version"])
        .unwrap_err();
    assert!(matches!(err, CmError::LaunchNotFound { .. }), "{err:?}");
}

#[cfg(unix)]
mod unix {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use cm::{CmError, Launcher, ModelOverrides};

    use super::temp_registry;

    fn script(dir: &Path, name: &str, body: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn child_sees_flag_args_and_credentials() {
        let (dir, registry) = temp_registry();
        let profile = registry
            .add_model(
                "work",
                "tok-123",
                "https://api.example.com",
                None,
                ModelOverrides {
                    opus: Some("opus-x".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        let fake_claude = script(
            dir.path(),
            "fake-claude",
            r#"[ "$1" = "--dangerously-skip-permissions" ] || exit 10
[ "$2" = "--resume" ] || exit 11
[ "$ANTHROPIC_AUTH_TOKEN" = "tok-123" ] || exit 12
[ "$ANTHROPIC_BASE_URL" = "https://api.example.com" ] || exit 13
[ "$ANTHROPIC_DEFAULT_OPUS_MODEL" = "opus-x" ] || exit 14
[ -n "$PATH" ] || exit 15
exit 7"#,
            0o755,
        );

        let code = Launcher::new(&fake_claude)
            .launch(&profile, &["--resume"])
            .unwrap();
        assert_eq!(code, 7);
    }

    #[test]
    fn non_executable_binary_is_a_generic_launch_error() {
        let (dir, registry) = temp_registry();
        let profile = super::add_simple(&registry, "work");
        let not_executable = script(dir.path(), "plain-file", "exit 0", 0o644);

        let err = Launcher::new(&not_executable)
            .launch(&profile, &[] as &[&str])
            .unwrap_err();
        assert!(matches!(err, CmError::Launch { .. }), "{err:?}");
    }
}

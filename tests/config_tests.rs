use localshare::config::Config;
use std::env;

// helper to clear env vars
fn clear_env() {
    env::remove_var("SHARE_DIR");
    env::remove_var("SHARE_HOST");
    env::remove_var("SHARE_PORT");
    env::remove_var("SHARE_PIN");
    env::remove_var("DISABLE_DELETE");
    env::remove_var("MAX_UPLOAD_SIZE");
    env::remove_var("WORKER_THREADS");
    env::remove_var("CLEANUP_ON_EXIT");
}

#[test]
fn test_hash_pin() {
    let pin = "1234";
    let hash = Config::hash_pin(pin);
    // sha256 hex string is 64 chars
    assert_eq!(hash.len(), 64);

    // deterministic
    assert_eq!(hash, Config::hash_pin(pin));

    // different pins produce different hashes
    assert_ne!(hash, Config::hash_pin("4321"));
}

#[test]
fn test_config_behavior() {
    // Run these sequentially to avoid race conditions with environment variables

    // 1. Test Defaults
    clear_env();

    let config = Config::from_env();

    assert_eq!(config.files_dir, Config::default_dir());
    assert!(config.files_dir.ends_with("LocalShare"));
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 5000);
    assert_eq!(config.worker_threads, 8);
    assert_eq!(config.max_upload_size, 16 * 1024 * 1024 * 1024);
    assert!(config.pin_hash.is_none());
    assert!(config.allow_delete);
    assert!(!config.cleanup_on_exit);

    // 2. Test From Env
    clear_env();

    env::set_var("SHARE_DIR", "/tmp/test_share");
    env::set_var("SHARE_PORT", "9090");
    env::set_var("WORKER_THREADS", "4");
    env::set_var("SHARE_PIN", " 2468 ");
    env::set_var("DISABLE_DELETE", "true");
    env::set_var("CLEANUP_ON_EXIT", "1");

    let config = Config::from_env();

    assert_eq!(config.files_dir.to_str().unwrap(), "/tmp/test_share");
    assert_eq!(config.port, 9090);
    assert_eq!(config.worker_threads, 4);
    assert_eq!(config.pin_hash, Some(Config::hash_pin("2468")));
    assert!(!config.allow_delete);
    assert!(config.cleanup_on_exit);

    // 3. Blank pin and bad numbers fall back
    clear_env();

    env::set_var("SHARE_PIN", "   ");
    env::set_var("SHARE_PORT", "not-a-port");
    env::set_var("WORKER_THREADS", "0");

    let config = Config::from_env();
    assert!(config.pin_hash.is_none());
    assert_eq!(config.port, 5000);
    assert_eq!(config.worker_threads, 8);

    // Cleanup
    clear_env();
}

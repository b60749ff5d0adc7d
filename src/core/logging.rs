//! Logging bootstrap.
//!
//! The crate only talks to the `log` facade; binaries and tests that want to
//! see output call [`init`] once (calling it again is harmless).

#[cfg(feature = "debug")]
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(cfg!(test))
        .try_init();
}

#[cfg(not(feature = "debug"))]
pub fn init() {}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_is_idempotent() {
        super::init();
        super::init();
        log::debug!("logging initialised twice without panicking");
    }
}

use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Wardflow";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8600";

/// Default tax rate applied to new invoices (8.5%).
pub const DEFAULT_TAX_RATE: f64 = 0.085;

/// Default per-day room charge for wards without a configured rate.
pub const DEFAULT_WARD_DAILY_RATE: f64 = 180.0;

/// Get the application data directory
/// ~/Wardflow/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Wardflow")
}

/// Path of the lifecycle database.
pub fn database_path() -> PathBuf {
    app_data_dir().join("wardflow.db")
}

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}

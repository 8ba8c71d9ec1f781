use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Extra declaration scripts run after the built-in unit table
    pub scripts: Vec<PathBuf>,
}

impl ServerConfig {
    /// Read `EMUNITS_ADDR` and `EMUNITS_SCRIPTS` (`:`-separated paths)
    pub fn from_env() -> Result<Self, String> {
        Self::from_values(
            std::env::var("EMUNITS_ADDR").ok().as_deref(),
            std::env::var("EMUNITS_SCRIPTS").ok().as_deref(),
        )
    }

    fn from_values(addr: Option<&str>, scripts: Option<&str>) -> Result<Self, String> {
        let addr_str = addr.unwrap_or(DEFAULT_ADDR);
        let addr = addr_str
            .parse()
            .map_err(|e| format!("Invalid EMUNITS_ADDR '{}': {}", addr_str, e))?;

        let scripts = scripts
            .map(|list| {
                list.split(':')
                    .filter(|p| !p.trim().is_empty())
                    .map(|p| PathBuf::from(p.trim()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { addr, scripts })
    }
}

use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

/// Restarts the resolver process. The only component that shells out.
#[async_trait]
pub trait ServiceReloader: Send + Sync {
    async fn reload(&self) -> Result<()>;
}

/// Runs a configured restart command, e.g. `systemctl restart dnsmasq` or
/// `/etc/init.d/dnsmasq restart`.
pub struct CommandReloader {
    program: String,
    args: Vec<String>,
}

impl CommandReloader {
    pub fn new(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| Error::Reload("empty reload command".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl ServiceReloader for CommandReloader {
    async fn reload(&self) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .await
            .map_err(|e| Error::Reload(format!("failed to run {}: {}", self.program, e)))?;

        if !status.success() {
            return Err(Error::Reload(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        info!("dnsmasq restarted");
        Ok(())
    }
}

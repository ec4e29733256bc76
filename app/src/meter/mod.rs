pub mod client;
pub mod compute;
pub mod model;
pub mod scheduler;
pub mod service;
pub mod urls;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MeterSide {
    #[display("import")]
    Import,
    #[display("export")]
    Export,
}

/// One physical meter endpoint. Constructed once at configuration time and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterIdentity {
    pub mpan: String,
    pub serial: String,
    pub side: MeterSide,
    pub name: String,
}

impl MeterIdentity {
    /// Stable key identifying this meter across restarts.
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.side, self.mpan, self.serial)
    }
}

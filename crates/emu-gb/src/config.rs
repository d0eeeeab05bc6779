//! Game Boy configuration.

/// Register state the CPU starts from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StartState {
    /// All registers zero, PC at $0000 (for images that carry their own
    /// boot code).
    Reset,
    /// Registers as the DMG boot ROM leaves them, PC at $0100.
    #[default]
    PostBoot,
}

/// Game Boy configuration.
#[derive(Debug, Clone, Default)]
pub struct GbConfig {
    /// Cartridge image, copied to $0000. At most 32 KiB (no banking).
    pub rom_data: Vec<u8>,
    /// Initial register state. Defaults to post-boot.
    pub start: StartState,
}

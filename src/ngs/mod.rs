// mod.rs - Voice rack plumbing shared by NGS modules

//! Shared pieces of the NGS voice emulation.
//!
//! A voice owns one module per processing stage; the modules here only see
//! the guest through two narrow seams:
//!
//! - [`GuestMemory`] - read access to the emulated address space
//! - [`lock::VoiceLocks`] - the scheduler and voice scopes held by the caller
//!
//! The ATRAC9 player lives in [`atrac9`].

pub mod atrac9;
pub mod lock;

pub use lock::VoiceLocks;

/// Address in the emulated (guest) address space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub u32);

impl Address {
    pub const NULL: Address = Address(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Address `bytes` past this one, or `None` on overflow
    pub fn offset(self, bytes: u32) -> Option<Address> {
        self.0.checked_add(bytes).map(Address)
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Address(value)
    }
}

/// Read access to guest memory
pub trait GuestMemory {
    /// Borrow `len` bytes starting at `address`, or `None` if any part of
    /// the range is unmapped.
    fn read(&self, address: Address, len: usize) -> Option<&[u8]>;
}

/// A flat memory image where an address is a byte index.
impl GuestMemory for [u8] {
    fn read(&self, address: Address, len: usize) -> Option<&[u8]> {
        let start = address.0 as usize;
        let end = start.checked_add(len)?;
        self.get(start..end)
    }
}

impl GuestMemory for Vec<u8> {
    fn read(&self, address: Address, len: usize) -> Option<&[u8]> {
        self.as_slice().read(address, len)
    }
}

/// Lifecycle state of a voice as seen by its modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Free for allocation; module state is discarded
    Available,
    Active,
    Paused,
    /// Released by the guest; the envelope is decaying
    KeyedOff,
}

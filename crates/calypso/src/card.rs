//! Image of a selected Calypso card

use bytes::Bytes;
use calypso_apdu_core::Response;
use tracing::debug;

use crate::channel::Selection;
use crate::constants::status;
use crate::responses::{Fci, StartupInfo, decode_fci};
use crate::revision::{BufferMode, Revision};
use crate::session::buffer::capacity_for;

/// What the terminal knows about a card after selecting its application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalypsoCard {
    atr: Bytes,
    fci: Fci,
    revision: Revision,
    df_invalidated: bool,
}

impl CalypsoCard {
    /// Build the card image from a selection
    pub fn from_selection(selection: &Selection) -> Self {
        Self::from_fci(selection.atr.clone(), &selection.fci)
    }

    /// Build the card image from the ATR and the selection response
    pub fn from_fci(atr: Bytes, response: &Response) -> Self {
        let fci = decode_fci(response.data());
        let revision =
            Revision::from_startup_info(fci.startup_info.map(|info| info.application_type));
        let df_invalidated = response.status() == status::DF_INVALIDATED;

        debug!(
            %revision,
            serial = ?fci.serial_number.as_deref().map(hex::encode_upper),
            df_invalidated,
            "Card image built"
        );
        Self {
            atr,
            fci,
            revision,
            df_invalidated,
        }
    }

    /// Answer To Reset
    pub const fn atr(&self) -> &Bytes {
        &self.atr
    }

    /// Decoded FCI
    pub const fn fci(&self) -> &Fci {
        &self.fci
    }

    /// Selected application
    pub fn aid(&self) -> Option<&[u8]> {
        self.fci.aid.as_deref()
    }

    /// Application serial number, used as key diversifier
    pub fn serial_number(&self) -> Option<&[u8]> {
        self.fci.serial_number.as_deref()
    }

    /// Startup information
    pub const fn startup_info(&self) -> Option<&StartupInfo> {
        self.fci.startup_info.as_ref()
    }

    /// Card revision
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// Whether the selected DF is invalidated
    pub const fn is_df_invalidated(&self) -> bool {
        self.df_invalidated
    }

    /// How in-session modifications are counted
    pub const fn buffer_mode(&self) -> BufferMode {
        self.revision.buffer_mode()
    }

    /// Session buffer capacity announced by the card
    pub fn session_buffer_capacity(&self) -> usize {
        capacity_for(
            self.fci.startup_info.map(|info| info.buffer_size_indicator),
            self.buffer_mode(),
        )
    }
}

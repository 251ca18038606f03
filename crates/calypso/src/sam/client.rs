use bytes::Bytes;
use calypso_apdu_core::Response;
use tracing::{debug, instrument, warn};

use super::{KeyReference, SamCommand};
use crate::channel::Channel;
use crate::responses::{check_status, sam as decode};
use crate::revision::SamRevision;
use crate::settings::SessionSettings;
use crate::Result;

/// SAM reached through its own channel
#[derive(Debug)]
pub struct Sam<C: Channel> {
    channel: C,
    revision: SamRevision,
}

impl<C: Channel> Sam<C> {
    /// Create a SAM client
    pub const fn new(channel: C, revision: SamRevision) -> Self {
        Self { channel, revision }
    }

    /// Create a SAM client for the revision named in the settings
    pub const fn from_settings(channel: C, settings: &SessionSettings) -> Self {
        Self::new(channel, settings.sam_revision)
    }

    /// Revision of the SAM
    pub const fn revision(&self) -> SamRevision {
        self.revision
    }

    /// Underlying channel
    pub const fn channel(&self) -> &C {
        &self.channel
    }

    /// Underlying channel, mutably
    pub const fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Take the channel back
    pub fn into_channel(self) -> C {
        self.channel
    }

    fn transmit(&mut self, command: &SamCommand) -> Result<Response> {
        let apdu = command.build(self.revision)?;
        self.channel.transmit(&apdu)
    }

    fn execute(&mut self, command: &SamCommand) -> Result<Response> {
        let apdu = command.build(self.revision)?;
        let response = self.channel.transmit(&apdu)?;
        check_status(command.command_ref(), &apdu, &response)?;
        Ok(response)
    }

    /// Select the card serial number as key diversifier
    pub fn select_diversifier(&mut self, serial: &[u8]) -> Result<()> {
        self.execute(&SamCommand::SelectDiversifier(Bytes::copy_from_slice(serial)))?;
        Ok(())
    }

    /// Get a challenge to hand to the card
    pub fn get_challenge(&mut self, length: u8) -> Result<Bytes> {
        let response = self.execute(&SamCommand::GetChallenge(length))?;
        decode::challenge(response.data(), length)
    }

    /// Start the session digest with the data returned by Open Secure Session
    pub fn digest_init(&mut self, key: KeyReference, rev3_2: bool, opening_data: &[u8]) -> Result<()> {
        self.execute(&SamCommand::DigestInit {
            verification: false,
            rev3_2,
            key,
            opening_data: Bytes::copy_from_slice(opening_data),
        })?;
        Ok(())
    }

    /// Feed one exchanged APDU into the digest
    pub fn digest_update(&mut self, data: Bytes) -> Result<()> {
        self.execute(&SamCommand::DigestUpdate {
            encrypted: false,
            data,
        })?;
        Ok(())
    }

    /// Finish the digest and get the terminal half-signature
    pub fn digest_close(&mut self, length: u8) -> Result<Bytes> {
        let response = self.execute(&SamCommand::DigestClose(length))?;
        decode::signature(response.data(), length)
    }

    /// Check the card half-signature
    ///
    /// A rejected signature is reported as `false`, not as an error.
    #[instrument(level = "debug", skip_all)]
    pub fn digest_authenticate(&mut self, card_signature: &[u8]) -> Result<bool> {
        let response =
            self.transmit(&SamCommand::DigestAuthenticate(Bytes::copy_from_slice(card_signature)))?;
        if response.is_success() {
            debug!("Card signature accepted");
            return Ok(true);
        }
        warn!(status = %response.status(), "Card signature rejected by the SAM");
        Ok(false)
    }

    /// Hand the card challenge to the SAM
    pub fn give_random(&mut self, card_challenge: &[u8]) -> Result<()> {
        self.execute(&SamCommand::GiveRandom(Bytes::copy_from_slice(card_challenge)))?;
        Ok(())
    }

    /// Compute the cryptogram loading `source` into the card
    pub fn card_generate_key(
        &mut self,
        ciphering: Option<KeyReference>,
        source: KeyReference,
    ) -> Result<Bytes> {
        let response = self.execute(&SamCommand::CardGenerateKey { ciphering, source })?;
        decode::ciphered_key(response.data())
    }
}

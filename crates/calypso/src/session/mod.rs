//! Secure session state machine
//!
//! A session moves through `Idle -> Opening -> Open -> Closing -> Closed`, or
//! ends in `Aborted` from any step after `Idle`. No state is entered twice.
//!
//! The card and the SAM are reached through their own [`Channel`]. Every
//! command exchanged with the card while the session is open is kept so the
//! SAM can replay it into the session digest on close.

pub mod buffer;

use bytes::Bytes;
use calypso_apdu_core::Response;
use derive_more::Display;
use tracing::{debug, instrument, warn};

pub use buffer::SessionBuffer;

use crate::card::CalypsoCard;
use crate::channel::Channel;
use crate::commands::{OpenSessionParams, PinPresentation, PoCommand};
use crate::responses::{
    OpenSessionData, check_status, decode_card_challenge, decode_close_session,
    decode_open_session, decode_pin_attempts,
};
use crate::revision::Revision;
use crate::sam::{KeyReference, MAX_DIGEST_DATA_LENGTH, Sam};
use crate::settings::{SessionAccessLevel, SessionSettings};
use crate::{Error, Result};

/// Length of the terminal half-signature asked from the SAM
const TERMINAL_SIGNATURE_LENGTH: u8 = 4;

/// Lifecycle of a secure session
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Nothing sent yet
    #[display("idle")]
    Idle,
    /// Open Secure Session in progress
    #[display("opening")]
    Opening,
    /// Session open, commands accepted
    #[display("open")]
    Open,
    /// Close Secure Session in progress
    #[display("closing")]
    Closing,
    /// Session closed, see [`SecureSession::successful`]
    #[display("closed")]
    Closed,
    /// Session abandoned
    #[display("aborted")]
    Aborted,
}

/// One command and its response, as exchanged with the card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Command bytes
    pub command: Bytes,
    /// Response bytes, status word included
    pub response: Bytes,
}

/// Secure session with a card, certified by a SAM
#[derive(Debug)]
pub struct SecureSession<'a, C: Channel, S: Channel> {
    card: &'a CalypsoCard,
    channel: &'a mut C,
    sam: &'a mut Sam<S>,
    settings: SessionSettings,
    state: SessionState,
    buffer: SessionBuffer,
    sam_challenge: Bytes,
    opening: Option<OpenSessionData>,
    key: Option<KeyReference>,
    exchanges: Vec<Exchange>,
    terminal_signature: Option<Bytes>,
    card_signature: Option<Bytes>,
    successful: bool,
}

impl<'a, C: Channel, S: Channel> SecureSession<'a, C, S> {
    /// Prepare a session; nothing is sent until [`open`](Self::open)
    pub fn new(
        card: &'a CalypsoCard,
        channel: &'a mut C,
        sam: &'a mut Sam<S>,
        settings: SessionSettings,
    ) -> Self {
        let capacity = settings
            .session_buffer_capacity
            .unwrap_or_else(|| card.session_buffer_capacity());
        Self {
            card,
            channel,
            sam,
            buffer: SessionBuffer::new(card.buffer_mode(), capacity),
            settings,
            state: SessionState::Idle,
            sam_challenge: Bytes::new(),
            opening: None,
            key: None,
            exchanges: Vec::new(),
            terminal_signature: None,
            card_signature: None,
            successful: false,
        }
    }

    /// Current state
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session closed with the card signature accepted by the SAM
    pub const fn successful(&self) -> bool {
        self.successful
    }

    /// Session buffer usage
    pub const fn buffer(&self) -> &SessionBuffer {
        &self.buffer
    }

    /// Data returned when the session was opened
    pub const fn opening(&self) -> Option<&OpenSessionData> {
        self.opening.as_ref()
    }

    /// Challenge given by the SAM
    pub const fn sam_challenge(&self) -> &Bytes {
        &self.sam_challenge
    }

    /// Session key, once the session is open
    pub const fn key(&self) -> Option<KeyReference> {
        self.key
    }

    /// Commands exchanged inside the session
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Terminal half-signature computed by the SAM
    pub const fn terminal_signature(&self) -> Option<&Bytes> {
        self.terminal_signature.as_ref()
    }

    /// Card half-signature returned by Close Secure Session
    pub const fn card_signature(&self) -> Option<&Bytes> {
        self.card_signature.as_ref()
    }

    /// Settings in use
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    fn revision(&self) -> Revision {
        self.card.revision()
    }

    fn expect_state(&self, expected: SessionState) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "Session state change");
        self.state = next;
    }

    fn transmit(&mut self, command: &PoCommand) -> Result<Response> {
        let revision = self.revision();
        let apdu = command.build(revision)?;
        let response = self.channel.transmit(&apdu)?;
        check_status(command.command_ref(revision), &apdu, &response)?;
        Ok(response)
    }

    /// Open the session
    ///
    /// The SAM is given the card serial number and asked for a challenge,
    /// then the card opens the session and optionally returns one record.
    /// Any failure leaves the session aborted.
    #[instrument(level = "debug", skip(self), fields(revision = %self.card.revision()))]
    pub fn open(
        &mut self,
        access_level: SessionAccessLevel,
        sfi: u8,
        record: u8,
    ) -> Result<&OpenSessionData> {
        self.expect_state(SessionState::Idle)?;
        self.transition(SessionState::Opening);

        match self.try_open(access_level, sfi, record) {
            Ok(data) => {
                self.transition(SessionState::Open);
                let data: &OpenSessionData = self.opening.insert(data);
                Ok(data)
            }
            Err(err) => {
                warn!(%err, "Session opening failed");
                self.transition(SessionState::Aborted);
                Err(match err {
                    err @ (Error::ChannelIo(_) | Error::OpeningFailed { .. }) => err,
                    cause => Error::OpeningFailed {
                        reason: "card or SAM refused to open the session",
                        source: Some(Box::new(cause)),
                    },
                })
            }
        }
    }

    fn try_open(
        &mut self,
        access_level: SessionAccessLevel,
        sfi: u8,
        record: u8,
    ) -> Result<OpenSessionData> {
        let card = self.card;
        let serial = card
            .serial_number()
            .ok_or(Error::OpeningFailed {
                reason: "card serial number unknown",
                source: None,
            })?;
        self.sam.select_diversifier(serial)?;
        self.sam_challenge = self.sam.get_challenge(self.settings.sam_challenge_length)?;

        let revision = self.revision();
        let response = self.transmit(&PoCommand::OpenSession(OpenSessionParams {
            key_index: self.settings.key_index_for(access_level),
            sfi,
            record,
            sam_challenge: self.sam_challenge.clone(),
        }))?;
        let data = decode_open_session(response.data(), revision)?;

        let key = KeyReference::new(
            data.kif.unwrap_or_else(|| self.settings.kif_for(access_level)),
            data.kvc,
        );
        debug!(
            kif = key.kif,
            kvc = key.kvc,
            counter = data.transaction_counter_value(),
            ratified = data.previous_session_ratified,
            "Session opened"
        );
        self.key = Some(key);
        Ok(data)
    }

    /// Send a command inside the open session
    ///
    /// The command is refused before anything is sent when it does not fit
    /// in the session buffer, and the session is aborted. An unsuccessful
    /// status from the card is handed back in the response; a channel
    /// failure, or a response too long for the session digest, aborts the
    /// session.
    #[instrument(level = "debug", skip_all, fields(command = %command.command_ref(self.card.revision())))]
    pub fn process(&mut self, command: &PoCommand) -> Result<Response> {
        self.expect_state(SessionState::Open)?;
        if matches!(
            command,
            PoCommand::OpenSession(_)
                | PoCommand::CloseSession { .. }
                | PoCommand::AbortSession
                | PoCommand::Ratification
        ) {
            return Err(Error::InconsistentArgument(
                "session control commands go through open, close and abort",
            ));
        }

        let revision = self.revision();
        let apdu = command.build(revision)?;
        let command_bytes = apdu.to_bytes();
        if command_bytes.len() > MAX_DIGEST_DATA_LENGTH {
            return Err(Error::InconsistentArgument("command too long for the session digest"));
        }
        if let Err(err) = self
            .buffer
            .reserve(command.session_buffer_cost(&apdu, self.buffer.mode()))
        {
            warn!(%err, "Session buffer exhausted");
            self.transition(SessionState::Aborted);
            return Err(err);
        }

        let response = match self.channel.transmit(&apdu) {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "Channel failure inside the session");
                self.transition(SessionState::Aborted);
                return Err(err);
            }
        };

        let response_bytes = response.to_bytes();
        if response_bytes.len() > MAX_DIGEST_DATA_LENGTH {
            let err = Error::UnexpectedResponse("response too long for the session digest");
            warn!(%err, len = response_bytes.len(), "Session cannot be certified");
            self.transition(SessionState::Aborted);
            return Err(err);
        }

        if let Err(err) = check_status(command.command_ref(revision), &apdu, &response) {
            debug!(%err, "Unsuccessful status left to the caller");
        }
        self.exchanges.push(Exchange {
            command: command_bytes,
            response: response_bytes,
        });
        Ok(response)
    }

    /// Close the session
    ///
    /// Returns whether the SAM accepted the card signature. A rejected
    /// signature still closes the session, with [`successful`](Self::successful)
    /// left false.
    #[instrument(level = "debug", skip(self), fields(exchanges = self.exchanges.len()))]
    pub fn close(&mut self) -> Result<bool> {
        self.expect_state(SessionState::Open)?;
        self.transition(SessionState::Closing);

        match self.try_close() {
            Ok(successful) => {
                self.successful = successful;
                self.transition(SessionState::Closed);
                Ok(successful)
            }
            Err(err) => {
                warn!(%err, "Session closing failed");
                self.transition(SessionState::Aborted);
                Err(err)
            }
        }
    }

    fn try_close(&mut self) -> Result<bool> {
        let revision = self.revision();
        let (key, opening) = match (self.key, self.opening.as_ref()) {
            (Some(key), Some(opening)) => (key, opening.raw.clone()),
            _ => return Err(Error::UnexpectedResponse("session was not opened")),
        };

        self.sam.digest_init(key, revision == Revision::Rev3_2, &opening)?;
        for exchange in &self.exchanges {
            self.sam.digest_update(exchange.command.clone())?;
            self.sam.digest_update(exchange.response.clone())?;
        }
        let terminal_signature = self.sam.digest_close(TERMINAL_SIGNATURE_LENGTH)?;
        self.terminal_signature = Some(terminal_signature.clone());

        let ratify = self.settings.ratify_on_close();
        let response = self.transmit(&PoCommand::CloseSession {
            signature: terminal_signature,
            ratification: ratify,
        })?;
        let closing = decode_close_session(response.data());

        if !ratify {
            self.send_ratification();
        }

        let card_signature = closing
            .signature
            .ok_or(Error::UnexpectedResponse("close session response carries no signature"))?;
        self.card_signature = Some(card_signature.clone());
        self.sam.digest_authenticate(&card_signature)
    }

    /// The card may already have left the field, the outcome does not matter
    fn send_ratification(&mut self) {
        let apdu = match PoCommand::Ratification.build(self.revision()) {
            Ok(apdu) => apdu,
            Err(err) => {
                debug!(%err, "Ratification not built");
                return;
            }
        };
        match self.channel.transmit(&apdu) {
            Ok(response) => debug!(status = %response.status(), "Ratification sent"),
            Err(err) => debug!(%err, "Ratification not delivered"),
        }
    }

    /// Cancel the open session
    ///
    /// The session is aborted whatever the card answers.
    #[instrument(level = "debug", skip(self))]
    pub fn abort(&mut self) -> Result<()> {
        self.expect_state(SessionState::Open)?;
        self.transition(SessionState::Aborted);
        self.transmit(&PoCommand::AbortSession)?;
        Ok(())
    }

    fn expect_idle(&self) -> Result<()> {
        self.expect_state(SessionState::Idle)
    }

    /// Present the PIN, outside a session
    #[instrument(level = "debug", skip_all)]
    pub fn verify_pin(&mut self, presentation: PinPresentation) -> Result<()> {
        self.expect_idle()?;
        self.transmit(&PoCommand::VerifyPin(presentation))?;
        Ok(())
    }

    /// Attempts left to present the PIN, outside a session
    pub fn check_pin_status(&mut self) -> Result<u8> {
        self.expect_idle()?;
        let response = self.transmit(&PoCommand::VerifyPin(PinPresentation::StatusCheck))?;
        decode_pin_attempts(response.status())
    }

    /// Load a new key into the card, outside a session
    ///
    /// The SAM ciphers `source` for the card challenge, using `ciphering` or
    /// the null key when absent.
    #[instrument(level = "debug", skip(self))]
    pub fn change_key(
        &mut self,
        key_index: u8,
        ciphering: Option<KeyReference>,
        source: KeyReference,
    ) -> Result<()> {
        self.expect_idle()?;
        let card = self.card;
        let serial = card
            .serial_number()
            .ok_or(Error::UnexpectedResponse("card serial number unknown"))?;

        let response = self.transmit(&PoCommand::GetChallenge)?;
        let card_challenge = decode_card_challenge(response.data())?;

        self.sam.select_diversifier(serial)?;
        self.sam.give_random(&card_challenge)?;
        let cryptogram = self.sam.card_generate_key(ciphering, source)?;

        self.transmit(&PoCommand::ChangeKey {
            key_index,
            cryptogram,
        })?;
        debug!(key_index, "Card key changed");
        Ok(())
    }
}

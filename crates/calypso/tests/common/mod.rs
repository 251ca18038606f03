//! Common test utilities

#![allow(dead_code)]

use std::collections::VecDeque;

use calypso::{Bytes, CalypsoCard, CardChannel, CardTransport, Response, Sam, SamRevision};
use calypso_apdu_core::Error as CoreError;

/// Card serial number used by every scripted card
pub const SERIAL: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x27, 0x4A, 0x9A, 0xB7];

/// Transport replaying queued responses and recording every command
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: VecDeque<Option<Bytes>>,
    pub sent: Vec<Bytes>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response, status word included
    pub fn reply(mut self, raw: &[u8]) -> Self {
        self.replies.push_back(Some(Bytes::copy_from_slice(raw)));
        self
    }

    /// Queue a transmission failure
    pub fn fail(mut self) -> Self {
        self.replies.push_back(None);
        self
    }

    /// Responses not consumed yet
    pub fn pending(&self) -> usize {
        self.replies.len()
    }
}

impl CardTransport for ScriptedTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, CoreError> {
        self.sent.push(Bytes::copy_from_slice(command));
        self.replies
            .pop_front()
            .flatten()
            .ok_or(CoreError::Transmission)
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn reset(&mut self) -> Result<(), CoreError> {
        Ok(())
    }
}

/// FCI of a card with the given application type and buffer size indicator
pub fn fci(application_type: u8, buffer_indicator: u8) -> Vec<u8> {
    let mut raw = vec![
        0x6F, 0x22, 0x84, 0x08, 0x33, 0x4D, 0x54, 0x52, 0x2E, 0x49, 0x43, 0x41, 0xA5, 0x16, 0xBF,
        0x0C, 0x13, 0xC7, 0x08,
    ];
    raw.extend_from_slice(&SERIAL);
    raw.extend_from_slice(&[
        0x53,
        0x07,
        buffer_indicator,
        0x3C,
        application_type,
        0x05,
        0x14,
        0x10,
        0x01,
        0x90,
        0x00,
    ]);
    raw
}

/// Card image built from a scripted FCI
pub fn card(application_type: u8, buffer_indicator: u8) -> CalypsoCard {
    let response = Response::from_bytes(&fci(application_type, buffer_indicator))
        .expect("scripted FCI carries a status word");
    CalypsoCard::from_fci(Bytes::new(), &response)
}

/// Revision 3.1 card with a 430 byte session buffer
pub fn card_rev3_1() -> CalypsoCard {
    card(0x20, 0x0A)
}

/// Revision 3.2 card with a 430 byte session buffer
pub fn card_rev3_2() -> CalypsoCard {
    card(0x28, 0x0A)
}

/// Revision 2.4 card allowing three operations per session
pub fn card_rev2_4() -> CalypsoCard {
    card(0x11, 0x03)
}

/// Channel to a scripted card
pub fn card_channel(transport: ScriptedTransport) -> CardChannel<ScriptedTransport> {
    CardChannel::new(transport)
}

/// C1 SAM behind a scripted transport
pub fn sam(transport: ScriptedTransport) -> Sam<CardChannel<ScriptedTransport>> {
    Sam::new(CardChannel::new(transport), SamRevision::C1)
}

/// Commands sent through a channel, as bytes
pub fn sent(channel: &CardChannel<ScriptedTransport>) -> &[Bytes] {
    &channel.transport().sent
}

/// Commands sent to a SAM, as bytes
pub fn sam_sent(sam: &Sam<CardChannel<ScriptedTransport>>) -> &[Bytes] {
    &sam.channel().transport().sent
}

/// Assert the exact bytes of every command sent, in order
pub fn assert_sent(sent: &[Bytes], expected: &[&[u8]]) {
    let sent: Vec<String> = sent.iter().map(hex::encode_upper).collect();
    let expected: Vec<String> = expected.iter().map(hex::encode_upper).collect();
    assert_eq!(sent, expected);
}

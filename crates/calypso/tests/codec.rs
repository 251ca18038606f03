//! Command building and response decoding across revisions

mod common;

use calypso::commands::{GetDataTarget, OpenSessionParams, PinPresentation, SelectFileTarget};
use calypso::responses::{self, EfType, FileCategory};
use calypso::{
    Bytes, CalypsoCard, Channel, CommandRef, Error, PoCommand, ReadMode, Revision, SessionSettings,
    StatusWord,
};
use common::ScriptedTransport;
use hex_literal::hex;

const CALYPSO_AID: [u8; 8] = hex!("33 4D 54 52 2E 49 43 41");

#[test]
fn test_select_then_list_files() {
    let mut channel = common::card_channel(
        ScriptedTransport::new()
            .reply(&common::fci(0x20, 0x0A))
            .reply(&hex!("C0 10 C1 06 20 01 07 02 1D 01 C1 06 20 20 19 09 03 09 90 00")),
    );

    let selection = channel.open_logical_channel(&CALYPSO_AID).unwrap();
    let card = CalypsoCard::from_selection(&selection);
    assert_eq!(card.revision(), Revision::Rev3_1);
    assert_eq!(card.aid(), Some(&CALYPSO_AID[..]));
    assert_eq!(card.serial_number(), Some(&common::SERIAL[..]));

    let command = PoCommand::GetData(GetDataTarget::EfList)
        .build(card.revision())
        .unwrap();
    let response = channel.transmit(&command).unwrap();
    let files = responses::decode_ef_list(response.data()).unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].category(), FileCategory::Environment);
    assert_eq!(files[0].structure(), Some(EfType::Linear));
    assert_eq!(files[1].lid, 0x2020);
    assert_eq!(files[1].category(), FileCategory::Counters);
    assert_eq!(files[1].structure(), Some(EfType::Counters));

    assert_eq!(
        common::sent(&channel)[1].as_ref(),
        hex!("00 CA 00 C0 00")
    );
}

#[test]
fn test_fci_partial_decode_keeps_leading_fields() {
    // Startup information cut short: the earlier fields survive
    let data = hex!(
        "6F 1F 84 08 33 4D 54 52 2E 49 43 41 A5 13 BF 0C 10 C7 08 00 00 00 00 27 4A 9A B7"
        "53 04 0A 3C 20 05"
    );
    let fci = responses::decode_fci(&data);
    assert_eq!(fci.aid.as_deref(), Some(&CALYPSO_AID[..]));
    assert_eq!(fci.serial_number.as_deref(), Some(&common::SERIAL[..]));
    assert_eq!(fci.startup_info, None);
    assert!(!fci.is_complete());

    let response = calypso::Response::success(Bytes::copy_from_slice(&data));
    let card = CalypsoCard::from_fci(Bytes::new(), &response);
    assert_eq!(card.revision(), Revision::Rev1_0);
    assert_eq!(card.session_buffer_capacity(), 3);
}

#[test]
fn test_every_revision_builds_every_command() {
    let commands = [
        PoCommand::OpenSession(OpenSessionParams {
            key_index: 1,
            sfi: 0x07,
            record: 1,
            sam_challenge: Bytes::copy_from_slice(&hex!("01 02 03 04")),
        }),
        PoCommand::CloseSession {
            signature: Bytes::copy_from_slice(&hex!("01 02 03 04")),
            ratification: true,
        },
        PoCommand::AbortSession,
        PoCommand::Ratification,
        PoCommand::GetChallenge,
        PoCommand::GetData(GetDataTarget::Fci),
        PoCommand::ReadRecords {
            sfi: 0x07,
            record: 1,
            mode: ReadMode::MultipleRecords,
            expected_length: 0,
        },
        PoCommand::AppendRecord {
            sfi: 0x08,
            data: Bytes::from_static(&[0x00; 29]),
        },
        PoCommand::Increase {
            sfi: 0x19,
            counter: 1,
            value: 100,
        },
        PoCommand::SelectFile(SelectFileTarget::Lid(0x2010)),
        PoCommand::VerifyPin(PinPresentation::StatusCheck),
        PoCommand::Invalidate,
        PoCommand::Rehabilitate,
    ];

    for revision in Revision::ALL {
        for command in &commands {
            let built = command.build(revision).unwrap();
            assert_eq!(built.class(), revision.class(), "{command:?} for {revision}");
            assert_eq!(
                built.instruction(),
                command.command_ref(revision).instruction(),
                "{command:?} for {revision}"
            );
        }
    }
}

#[test]
fn test_open_session_variants() {
    let params = OpenSessionParams {
        key_index: 3,
        sfi: 0x08,
        record: 1,
        sam_challenge: Bytes::copy_from_slice(&hex!("01 02 03 04")),
    };
    let open = PoCommand::OpenSession(params);

    let expected: [(Revision, CommandRef, &[u8]); 4] = [
        (Revision::Rev1_0, CommandRef::OpenSession10, &hex!("94 8A 0B 40 04 01 02 03 04 00")),
        (Revision::Rev2_4, CommandRef::OpenSession24, &hex!("94 8A 8B 40 04 01 02 03 04 00")),
        (Revision::Rev3_1, CommandRef::OpenSession31, &hex!("00 8A 0B 40 04 01 02 03 04 00")),
        (Revision::Rev3_2, CommandRef::OpenSession32, &hex!("00 8A 0B 42 05 00 01 02 03 04 00")),
    ];
    for (revision, command_ref, bytes) in expected {
        assert_eq!(open.command_ref(revision), command_ref);
        assert_eq!(open.build(revision).unwrap().to_bytes().as_ref(), bytes);
    }
}

#[test]
fn test_arguments_checked_before_building() {
    let bad = [
        PoCommand::ReadRecords {
            sfi: 0x20,
            record: 1,
            mode: ReadMode::OneRecord,
            expected_length: 0,
        },
        PoCommand::UpdateRecord {
            sfi: 0x08,
            record: 0,
            data: Bytes::from_static(&[0x01]),
        },
        PoCommand::ChangeKey {
            key_index: 4,
            cryptogram: Bytes::from_static(&[0x00; 24]),
        },
        PoCommand::VerifyPin(PinPresentation::Ciphered(Bytes::from_static(&[0x00; 4]))),
    ];
    for command in &bad {
        let err = command.build(Revision::Rev3_1).unwrap_err();
        assert!(matches!(err, Error::InconsistentArgument(_)), "{command:?}");
        assert!(err.is_precondition());
    }
}

#[test]
fn test_status_words() {
    assert!(StatusWord::from(0x9000).is_success());
    assert!(!StatusWord::from(0x0000).is_success());
    assert!(StatusWord::from(0x6283).is_warning());

    let err = responses::check_status(
        CommandRef::UpdateRecord,
        &PoCommand::UpdateRecord {
            sfi: 0x08,
            record: 1,
            data: Bytes::from_static(&[0x01]),
        }
        .build(Revision::Rev3_1)
        .unwrap(),
        &calypso::Response::error(StatusWord::from(0x6400)),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Update Record failed with status 6400: Too many modifications in session."
    );
}

#[test]
fn test_ratification_flag_per_revision() {
    let rev3 = |flag: u8| {
        let data = [0x00, 0x00, 0x01, 0x55, 0x00, flag, 0x79, 0x00];
        responses::decode_open_session(&data, Revision::Rev3_1)
            .unwrap()
            .previous_session_ratified
    };
    assert!(!rev3(0x01));
    assert!(rev3(0x00));
    assert!(rev3(0x30));

    let legacy = |data: &[u8]| {
        responses::decode_open_session(data, Revision::Rev2_4)
            .unwrap()
            .previous_session_ratified
    };
    assert!(legacy(&hex!("79 03 0D 0E FA")));
    assert!(!legacy(&hex!("79 03 0D 0E FA 30")));
    assert!(!legacy(&hex!("79 03 0D 0E FA 30 00 AA")));
}

#[test]
fn test_settings_from_json() {
    let settings: SessionSettings = serde_json::from_str(
        r#"{
            "default_kif": [33, 39, 48],
            "key_index": [1, 2, 3],
            "ratification_mode": "CloseNotRatified",
            "session_buffer_capacity": 215,
            "sam_revision": "S1D",
            "sam_challenge_length": 8
        }"#,
    )
    .unwrap();
    assert!(!settings.ratify_on_close());
    assert_eq!(settings.session_buffer_capacity, Some(215));

    let card = common::card_rev3_1();
    let mut channel = common::card_channel(ScriptedTransport::new());
    let sam_channel = common::card_channel(ScriptedTransport::new());
    let mut sam = calypso::Sam::from_settings(sam_channel, &settings);
    assert_eq!(sam.revision(), calypso::SamRevision::S1D);

    let session = calypso::SecureSession::new(&card, &mut channel, &mut sam, settings);
    assert_eq!(session.buffer().capacity(), 215);
}

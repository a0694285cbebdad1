use proptest::prelude::*;
use statehub::{
    decode::{decode_command_chain, decode_header, decode_settlement_record},
    receipt::{address_from_key, signing_key_from_hex},
    recover_signer, Address, ChainedCallCommand, CommandChain, ErrorKind, LocalSigner,
    MessageBuilder, ReceiptSigner, SettlementRecord, U256,
};

const SECRET: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

fn field(n: u64) -> String {
    format!("{:064x}", n)
}

#[test_log::test]
fn channel_creation_with_channel_id() {
    let builder = MessageBuilder::default();
    let msg = builder
        .build_channel_creation_message(Some(U256::from(5)), U256::from(2500), None)
        .unwrap();
    assert_eq!(msg, format!("0x02{}{}", field(2500), field(5)));
}

#[test_log::test]
fn deposits_then_chain_payload() {
    let mut builder = MessageBuilder::new(1);
    builder.register_channel_deposit(U256::from(1), U256::from(1000));
    builder.register_channel_deposit(U256::from(2), U256::from(2000));
    builder.register_channel_deposit(U256::from(3), U256::from(3000));

    // deploy through a factory, then call the deployed contract
    let factory = Address([0xfa; 20]);
    let create = [0x9f, 0x14, 0x5a, 0x17];
    let init = [0x8a, 0x3b, 0x2c, 0x1d, 0x00, 0x01];
    let mut chain = CommandChain::new();
    let created = chain
        .append(ChainedCallCommand::literal(factory, &create).unwrap(), &create)
        .unwrap();
    chain
        .append(
            ChainedCallCommand::from_result(created, 12, &init).unwrap(),
            &init,
        )
        .unwrap();

    let payload = builder.build_payload(&chain).unwrap();
    let (header, body) = decode_header(&payload).unwrap();
    assert_eq!(header.version, 1);
    assert_eq!(header.channel_count, 3);
    assert_eq!(header.total_length as usize, 6 + 32 + 34);
    assert_eq!(hex::encode(&body), chain.serialize());

    let commands = decode_command_chain(&hex::encode(&body)).unwrap();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[1].0.result_id, created);
    assert_eq!(commands[1].1, init.to_vec());

    // the same builder keeps counting until reset
    builder.reset();
    let (header, _) = decode_header(&builder.build_payload(&chain).unwrap()).unwrap();
    assert_eq!(header.channel_count, 0);
}

#[test_log::test]
fn forward_reference_is_rejected() {
    let mut chain = CommandChain::new();
    let err = chain
        .append(ChainedCallCommand::from_result(0, 0, &[]).unwrap(), &[])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[test_log::test(tokio::test)]
async fn settlement_receipt_end_to_end() {
    let key = signing_key_from_hex(SECRET).unwrap();
    let record = SettlementRecord {
        channel_id: U256::from(1),
        round: U256::from(5),
        balance_a: U256::from(500),
        balance_b: U256::from(200),
    };
    let receipt = ReceiptSigner::new(LocalSigner)
        .build_spend_receipt(&record, &key)
        .await
        .unwrap();

    assert_eq!(
        receipt.data,
        format!("0x{}{}{}{}", field(1), field(5), field(500), field(200))
    );
    assert_eq!(decode_settlement_record(&receipt.data).unwrap(), record);

    // the counter-party only sees JSON
    let json = serde_json::to_string(&receipt).unwrap();
    let received = serde_json::from_str(&json).unwrap();
    assert_eq!(receipt, received);
    assert_eq!(recover_signer(&received).unwrap(), address_from_key(&key));
}

proptest! {
    #[test]
    fn header_total_length_counts_body_bytes(body in proptest::collection::vec(any::<u8>(), 0..512), version in any::<u16>()) {
        let builder = MessageBuilder::new(version);
        let wrapped = builder.build_header_wrapped(&hex::encode(&body)).unwrap();
        let (header, decoded) = decode_header(&wrapped).unwrap();
        prop_assert_eq!(header.total_length as usize, body.len() + 6);
        prop_assert_eq!(header.version, version);
        prop_assert_eq!(decoded, body);
    }
}

use assert_cmd::Command;
use std::io::Write;

const SECRET: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

fn statehub() -> Command {
    let mut cmd = Command::cargo_bin("statehub").unwrap();
    cmd.env_remove("STATEHUB_SIGNING_KEY")
        .env_remove("STATEHUB_VERSION")
        .env_remove("STATEHUB_LOG_FORMAT");
    cmd
}

fn stdout(cmd: &mut Command) -> String {
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out).unwrap().trim().to_string()
}

#[test]
fn channel_command() {
    let out = stdout(statehub().args(["channel", "--amount", "2500", "--channel-id", "5"]));
    assert_eq!(out.len(), 2 + 130);
    assert!(out.starts_with("0x02"));

    let out = stdout(statehub().args([
        "channel",
        "--amount",
        "1",
        "--to",
        "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23",
    ]));
    assert_eq!(out.len(), 2 + 106);
    assert!(out.ends_with("2c7536e3605d9c16a7a3d7b1898e529396a65c23"));
}

#[test]
fn channel_command_needs_target() {
    statehub()
        .args(["channel", "--amount", "1"])
        .assert()
        .failure();
}

#[test]
fn header_command() {
    let out = stdout(statehub().args([
        "header", "--body", "0xaabbcc", "--deposit", "1:100", "--deposit", "2:200",
    ]));
    assert_eq!(out, "000100020009aabbcc");
}

#[test]
fn spend_and_recover() {
    let out = stdout(
        statehub()
            .env("STATEHUB_SIGNING_KEY", SECRET)
            .args([
                "spend",
                "--channel-id",
                "1",
                "--round",
                "5",
                "--balance-a",
                "500",
                "--balance-b",
                "200",
            ]),
    );
    let receipt: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        receipt["hash"],
        "0x30a5ddd64adfc1e6034fdf47f4391fdfe08c77208532b8a46400662695615f06"
    );

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(out.as_bytes()).unwrap();
    let signer = stdout(statehub().args(["recover", "--file"]).arg(file.path()));
    assert_eq!(signer, "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23");
}

#[test]
fn spend_without_key_fails() {
    statehub()
        .args([
            "spend",
            "--channel-id",
            "1",
            "--round",
            "1",
            "--balance-a",
            "1",
            "--balance-b",
            "1",
        ])
        .assert()
        .failure();
}

#[test]
fn chain_command() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"kind": "literal", "data_length": 1, "to_address": "0x{addr}", "call_data": "01"}},
            {{"kind": "from_result", "data_length": 0, "result_id": 0, "offset": 12}}
        ]"#,
        addr = "aa".repeat(20)
    )
    .unwrap();

    let out = stdout(statehub().args(["chain", "--file"]).arg(file.path()));
    assert_eq!(out.len(), 2 * (29 + 28));

    let wrapped = stdout(
        statehub()
            .args(["chain", "--wrap", "--file"])
            .arg(file.path()),
    );
    assert_eq!(wrapped, format!("00010000003f{out}"));
}

#[test]
fn chain_command_rejects_forward_reference() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"kind": "from_result", "data_length": 0, "result_id": 0}}]"#
    )
    .unwrap();
    statehub()
        .args(["chain", "--file"])
        .arg(file.path())
        .assert()
        .failure();
}

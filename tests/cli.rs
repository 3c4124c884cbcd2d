use assert_cmd::Command;

#[test]
fn more_than_one_argument_is_a_usage_error() {
    Command::cargo_bin("lox")
        .unwrap()
        .arg("tests/target/arithmetic/precedence.lox")
        .arg("extra")
        .assert()
        .code(64)
        .stdout("Usage: lox [script]\n")
        .failure();
}

#[test]
fn a_clean_script_exits_zero() {
    Command::cargo_bin("lox")
        .unwrap()
        .arg("tests/target/arithmetic/precedence.lox")
        .assert()
        .code(0)
        .stdout("7\n")
        .success();
}

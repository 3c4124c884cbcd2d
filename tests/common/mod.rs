#[macro_export]
macro_rules! tests {
    ($file:ident in $scope:ident is OK $($expected:expr)*) => {
        #[test]
        fn $file() {
            use lox::Lox;

            let mut expected = vec![$($expected),*];

            // if exists, concat expected lines with new lines
            let expected = match expected.len() {
                0 => "".to_string(),
                _ => {
                    // add empty string to end to add new line to end of output
                    expected.push("");
                    expected.join("\n")
                }
            };

            let mut output = Vec::new();
            let exit_code = {
                let mut interpreter = Lox::new(&mut output);
                interpreter.run_file(&format!("tests/target/{}/{}.lox", stringify!($scope), stringify!($file)))
            };

            assert_eq!(exit_code, 0, "expected a clean exit, stdout was {:?}", std::str::from_utf8(&output));
            assert_eq!(expected, std::str::from_utf8(&output).unwrap());
        }
    };

    ($file:ident in $scope:ident is ERR $exit:expr, $expected:expr) => {
        #[test]
        fn $file() {
            use assert_cmd::Command;
            let file = format!("tests/target/{}/{}.lox", stringify!($scope), stringify!($file));

            let assert = Command::cargo_bin("lox").unwrap().arg(file).assert().code($exit).failure();
            let output = assert.get_output();
            let stderr = std::str::from_utf8(&output.stderr).unwrap();
            assert!(stderr.contains($expected), "stderr {stderr:?} did not contain {:?}", $expected);
        }
    };
}

#![cfg(feature = "serde")]

use std::{ffi::OsString, path::PathBuf, str::FromStr};

use marktex::{Markdown, Token};

const INPUT_DIR: &'static str = "./tests/input_files";
const LEX_DIR: &'static str = "./tests/lex_files";

fn input_files() -> impl Iterator<Item = (OsString, String)> {
    let mut paths = std::fs::read_dir(INPUT_DIR)
        .expect("Should be able to access input directory")
        .map(|file| {
            file.expect("Should be able to access files in input directory")
                .path()
        })
        .collect::<Vec<_>>();
    paths.sort();
    paths.into_iter().map(|file_path| {
        let input =
            std::fs::read_to_string(&file_path).expect("Should be able to read input files");
        (OsString::from(file_path.file_name().unwrap()), input)
    })
}

fn lex(input: &str) -> Vec<Token<'static>> {
    match Markdown::new().tokens(input) {
        Ok(ok) => ok,
        Err(err) => {
            panic!("Should successfully lex the input: {err:#?}");
        }
    }
}

/// Prints input file's tokens into the stdout, for inspection
#[ignore = "manual"]
#[test]
fn show_lex() {
    for (filename, input) in input_files() {
        println!("{}:\n{:#?}", filename.to_string_lossy(), lex(&input));
    }
}

/// Rewrites expected token dumps with the current ones
#[ignore = "manual"]
#[test]
fn gen_lex_output() {
    let mut output_path = PathBuf::from_str(LEX_DIR).unwrap();
    if !output_path.is_dir() {
        std::fs::create_dir(&output_path).expect("Failed to create directory");
    }
    for (filename, input) in input_files() {
        let repr = serde_json::to_string_pretty(&lex(&input)).expect("Tokens should serialize");
        output_path.push(filename);
        output_path.set_extension("json");
        std::fs::write(&output_path, repr + "\n").expect("Failed to write output file");
        output_path.pop();
    }
}

#[test]
fn test_lex() {
    let mut output_path = PathBuf::from_str(LEX_DIR).unwrap();
    let mut failures = Vec::new();
    for (filename, input) in input_files() {
        let real = serde_json::to_value(lex(&input)).expect("Tokens should serialize");
        let expected: serde_json::Value = {
            output_path.push(&filename);
            output_path.set_extension("json");
            let output =
                std::fs::read_to_string(&output_path).expect("Failed to read expected output");
            output_path.pop();
            serde_json::from_str(&output).expect("Expected output should be valid json")
        };
        if real != expected {
            failures.push(format!(
                "\tFilename: {}\n\tActual: {real:#}\n\tExpected: {expected:#}\n",
                filename.to_string_lossy()
            ));
        }
    }
    if !failures.is_empty() {
        panic!("Failures:\n{}", failures.join("\n"));
    }
}

use std::{ffi::OsString, path::PathBuf, str::FromStr};

const CLEAR: &'static str = "\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n";
const INPUT_DIR: &'static str = "./tests/input_files";
const TRANSFORM_DIR: &'static str = "./tests/transformed_files";

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

/// Prints transformation of input files into the stdout, for inspection
#[ignore = "manual"]
#[test]
fn show_transform() {
    for (filename, input) in input_files() {
        let output = match marktex::convert(input.as_str()) {
            Ok(ok) => ok,
            Err(err) => {
                panic!("Should successfully convert the input: {err:#?}");
            }
        };
        println!("{}:\n{output}", filename.to_string_lossy());
        std::io::stdin()
            .read_line(&mut String::new())
            .expect("Should be able to read a line");
        println!("{}", CLEAR);
    }
}

/// Rewrites expected outputs with the current ones
#[ignore = "manual"]
#[test]
fn gen_transform_output() {
    use std::io::Write;
    {
        use std::io::Read;
        print!("Are you sure? This will rewrite previous test outputs: [y/N]: ");
        std::io::stdout()
            .flush()
            .expect("Should be able to flush the stdout");

        let mut buf = [0u8; 1];
        std::io::stdin()
            .read_exact(&mut buf)
            .expect("Should be able to read stdin");
        if buf[0] != b'y' {
            println!("\nAborting...");
            return;
        }
    }
    let mut output_path = PathBuf::from_str(TRANSFORM_DIR).unwrap();
    if !output_path.is_dir() {
        std::fs::create_dir(&output_path).expect("Failed to create directory");
    }
    for (filename, input) in input_files() {
        let output = match marktex::convert(input.as_str()) {
            Ok(ok) => ok,
            Err(err) => {
                panic!("Input files should be successfully converted: {err:#?}");
            }
        };
        output_path.push(filename);
        output_path.set_extension("tex");
        std::fs::write(&output_path, output).expect("Failed to write output file");
        output_path.pop();
    }
}

#[test]
fn test_transform() {
    let mut output_results = Vec::new();
    let mut output_path = PathBuf::from_str(TRANSFORM_DIR).unwrap();
    for (filename, input) in input_files() {
        let output = match marktex::convert(input.as_str()) {
            Ok(ok) => ok,
            Err(err) => {
                panic!("Should successfully convert the input: {err:#?}");
            }
        };
        let expected_output = {
            output_path.push(&filename);
            output_path.set_extension("tex");
            let output =
                std::fs::read_to_string(&output_path).expect("Failed to read expected output");
            output_path.pop();
            output
        };
        output_results.push((filename, output, expected_output));
    }
    let total = output_results.len();
    let success = output_results
        .iter()
        .filter(|(_, real, expected)| real == expected)
        .count();
    let failed = total - success;
    if failed > 0 {
        let mut output_msg = String::new();
        output_msg.push_str(&format!("passed: ({success}/{total})\nFailures:\n"));
        for (filename, real, expected) in output_results {
            if real != expected {
                println!("Diff for {}:", filename.to_string_lossy());
                text_diff::print_diff(expected.as_str(), real.as_str(), "\n");
                output_msg.push_str(&format!("\tFilename: {}\n", filename.to_string_lossy()));
            }
        }
        panic!("{output_msg}");
    }
}

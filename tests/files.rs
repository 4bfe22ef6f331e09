#[cfg(test)]
mod file_tests {
    use std::path::Path;

    use nox::error::NoxError;
    use nox::nox::Nox;

    fn run_capture(source: &str) -> (String, Result<(), NoxError>) {
        let mut runtime = Nox::new();
        let buffer = runtime.interpreter_mut().capture_output();
        let result = runtime.run(source);
        let output = buffer.borrow().clone();
        (output, result)
    }

    fn assert_output(source: &str, expected_lines: &[&str]) {
        let (output, result) = run_capture(source);

        if let Err(err) = result {
            panic!("script failed: {}\noutput so far: {}", err, output);
        }

        assert_eq!(output.lines().collect::<Vec<_>>(), expected_lines);
    }

    fn temp_path(dir: &Path, name: &str) -> String {
        dir.join(name).display().to_string()
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = temp_path(dir.path(), "out.txt");

        assert_output(
            &format!(
                "let f = open(\"{0}\", \"w\")\nf.write(\"hello\")\nf.close()\n\
                 let g = open(\"{0}\", \"r\")\nprint g.read()\ng.close()",
                path
            ),
            &["hello"],
        );
    }

    #[test]
    fn test_readline_returns_nil_at_eof() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = temp_path(dir.path(), "lines.txt");
        std::fs::write(&path, "first\nsecond\n").expect("fixture");

        assert_output(
            &format!(
                "let f = open(\"{}\", \"r\")\n\
                 print f.readline()\nprint f.readline()\nprint f.readline()\nf.close()",
                path
            ),
            &["first", "second", "nil"],
        );
    }

    #[test]
    fn test_seek_and_tell() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = temp_path(dir.path(), "seek.txt");
        std::fs::write(&path, "abcdef").expect("fixture");

        assert_output(
            &format!(
                "let f = open(\"{}\", \"r\")\nf.seek(2, 0)\nprint f.tell()\nprint f.read()\nf.close()",
                path
            ),
            &["2", "cdef"],
        );
    }

    #[test]
    fn test_append_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = temp_path(dir.path(), "log.txt");
        std::fs::write(&path, "a").expect("fixture");

        assert_output(
            &format!(
                "let f = open(\"{0}\", \"a\")\nf.write(\"b\")\nf.close()\n\
                 let g = open(\"{0}\", \"r\")\nprint g.read()\ng.close()",
                path
            ),
            &["ab"],
        );
    }

    #[test]
    fn test_exists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = temp_path(dir.path(), "here.txt");
        std::fs::write(&path, "x").expect("fixture");

        assert_output(
            &format!("let f = open(\"{}\", \"r\")\nprint f.exists()\nf.close()", path),
            &["true"],
        );
    }

    #[test]
    fn test_with_closes_file_handle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = temp_path(dir.path(), "managed.txt");

        // After the with block the handle is closed: further writes fail,
        // which `?` converts to nil.
        assert_output(
            &format!(
                "let f = open(\"{0}\", \"w\")\nwith f as out {{ out.write(\"data\") }}\n\
                 print ?f.write(\"more\")\n\
                 let g = open(\"{0}\", \"r\")\nprint g.read()\ng.close()",
                path
            ),
            &["nil", "data"],
        );
    }

    #[test]
    fn test_operations_on_closed_handle_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = temp_path(dir.path(), "closed.txt");
        std::fs::write(&path, "x").expect("fixture");

        let (_, result) = run_capture(&format!(
            "let f = open(\"{}\", \"r\")\nf.close()\nf.read()",
            path
        ));

        let err = result.expect_err("read after close must fail");
        assert!(err.to_string().contains("File is closed."));
    }

    #[test]
    fn test_write_bytes_and_read_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = temp_path(dir.path(), "bytes.bin");

        assert_output(
            &format!(
                "let f = open(\"{0}\", \"wb\")\nf.write_bytes([104, 105])\nf.close()\n\
                 let g = open(\"{0}\", \"rb\")\nprint g.read_bytes()\ng.close()",
                path
            ),
            &["[104, 105]"],
        );
    }

    #[test]
    fn test_unsupported_mode_errors() {
        let (_, result) = run_capture("open(\"whatever\", \"z\")");
        let err = result.expect_err("bad mode must fail");
        assert!(err.to_string().contains("unsupported file mode"));
    }

    #[test]
    fn test_bad_mode_is_runtime_error_kind() {
        let (_, result) = run_capture("open(\"whatever\", \"z\")");
        assert!(matches!(result, Err(NoxError::Runtime { .. })));
    }
}

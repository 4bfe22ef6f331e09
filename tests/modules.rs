#[cfg(test)]
mod module_tests {
    use std::fs;
    use std::path::Path;

    use nox::error::NoxError;
    use nox::nox::Nox;

    fn write_module(dir: &Path, name: &str, source: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, source).expect("module file should be writable");
        path.display().to_string()
    }

    fn library_source() -> &'static str {
        "export func greet(name) { return \"hi \" + name }\n\
         export let answer = 42\n\
         let hidden = 1\n\
         print \"loaded\"\n"
    }

    fn run_capture(runtime: &mut Nox, source: &str) -> (String, Result<(), NoxError>) {
        let buffer = runtime.interpreter_mut().capture_output();
        let result = runtime.run(source);
        let output = buffer.borrow().clone();
        (output, result)
    }

    #[test]
    fn test_import_with_alias() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_module(dir.path(), "lib.nox", library_source());

        let source = format!(
            "import \"{}\" as lib\nprint lib.greet(\"ada\"), lib.answer",
            path
        );

        let mut runtime = Nox::new();
        let (output, result) = run_capture(&mut runtime, &source);
        result.expect("import should succeed");

        assert_eq!(output.lines().collect::<Vec<_>>(), vec!["loaded", "hi ada 42"]);
    }

    #[test]
    fn test_bare_import_copies_exports() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_module(dir.path(), "lib.nox", library_source());

        let source = format!("import \"{}\"\nprint greet(\"bo\"), answer", path);

        let mut runtime = Nox::new();
        let (output, result) = run_capture(&mut runtime, &source);
        result.expect("import should succeed");

        assert_eq!(
            output.lines().collect::<Vec<_>>(),
            vec!["loaded", "hi bo 42"]
        );
    }

    #[test]
    fn test_unexported_names_stay_private() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_module(dir.path(), "lib.nox", library_source());

        // Not injected by a bare import...
        let mut runtime = Nox::new();
        let source = format!("import \"{}\"\nprint hidden", path);
        let (_, result) = run_capture(&mut runtime, &source);
        let err = result.expect_err("hidden must not be injected");
        assert!(err.to_string().contains("Undefined variable 'hidden'."));

        // ...and not reachable through the module object either.
        let mut runtime = Nox::new();
        let source = format!("import \"{}\" as lib\nprint lib.hidden", path);
        let (_, result) = run_capture(&mut runtime, &source);
        let err = result.expect_err("hidden must not be exported");
        assert!(err.to_string().contains("no exported member 'hidden'"));
    }

    #[test]
    fn test_module_loading_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_module(dir.path(), "lib.nox", library_source());

        let source = format!(
            "import \"{0}\" as a\nimport \"{0}\" as b\nprint a == b",
            path
        );

        let mut runtime = Nox::new();
        let (output, result) = run_capture(&mut runtime, &source);
        result.expect("imports should succeed");

        // Side effects ran once; the second import hit the cache, and both
        // aliases are the identical module object.
        assert_eq!(output.lines().collect::<Vec<_>>(), vec!["loaded", "true"]);
    }

    #[test]
    fn test_extension_is_appended() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_module(dir.path(), "util.nox", "export let tau = 6.28\n");

        let bare = dir.path().join("util").display().to_string();
        let source = format!("import \"{}\" as util\nprint util.tau", bare);

        let mut runtime = Nox::new();
        let (output, result) = run_capture(&mut runtime, &source);
        result.expect("import should succeed");

        assert_eq!(output.trim(), "6.28");
    }

    #[test]
    fn test_missing_module_errors() {
        let mut runtime = Nox::new();
        let (_, result) = run_capture(&mut runtime, "import \"/no/such/module\" as m");
        let err = result.expect_err("missing module should fail");

        assert!(matches!(err, NoxError::Runtime { .. }));
        assert!(err.to_string().contains("Cannot open module"));
    }

    #[test]
    fn test_module_globals_are_isolated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_module(
            dir.path(),
            "iso.nox",
            "let counter = 99\nexport func peek() { return counter }\n",
        );

        // The module's `counter` lives in its own top level; the importer's
        // global of the same name is untouched.
        let source = format!(
            "let counter = 1\nimport \"{}\" as iso\nprint iso.peek(), counter",
            path
        );

        let mut runtime = Nox::new();
        let (output, result) = run_capture(&mut runtime, &source);
        result.expect("import should succeed");

        assert_eq!(output.trim(), "99 1");
    }

    #[test]
    fn test_module_functions_keep_module_scope() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_module(
            dir.path(),
            "state.nox",
            "let n = 0\nexport func bump() { n = n + 1 return n }\n",
        );

        let source = format!(
            "import \"{}\" as state\nstate.bump()\nprint state.bump()",
            path
        );

        let mut runtime = Nox::new();
        let (output, result) = run_capture(&mut runtime, &source);
        result.expect("import should succeed");

        assert_eq!(output.trim(), "2");
    }
}

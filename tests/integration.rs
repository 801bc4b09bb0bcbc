//! Integration tests: drive full runs through the public API and compare
//! the TAP stream line by line.

use std::io::Write;

use tap_reporter::{Output, RunConfig, Runner, SharedBuffer};

fn buffered() -> (Runner, SharedBuffer) {
    let buf = SharedBuffer::new();
    let runner = tap_reporter::builder()
        .output(Output::from_writer(buf.clone()))
        .build();
    (runner, buf)
}

#[test]
fn nested_subtests_with_short_plans() {
    let (runner, buf) = buffered();
    let res = runner.run(|t| {
        t.ok(true, "foo");
        t.subtest("first subtest", |t| {
            t.plan(3);
            t.ok(true, "bar");
            t.ok(true, "baz");
        });
        t.subtest("second subtest", |t| {
            t.plan(3);
            t.diag("Hello");
            t.ok(true, "bar");
            t.ok(true, "baz");
            t.subtest("third subtest", |t| {
                t.plan(3);
                t.diag("World");
                t.ok(true, "bar");
                t.ok(true, "baz");
            });
        });
    });
    assert!(!res);

    let expected = "\
1..0
ok 1 - foo
# Subtest: first subtest
  1..3
  ok 1 - bar
  ok 2 - baz
  # Planned 3 tests but ran 2
not ok 2 - first subtest
# Subtest: second subtest
  1..3
  # Hello
  ok 1 - bar
  ok 2 - baz
  # Subtest: third subtest
    1..3
    # World
    ok 1 - bar
    ok 2 - baz
    # Planned 3 tests but ran 2
  not ok 3 - third subtest
  # Tests failed: 1/3
not ok 3 - second subtest
# Tests failed: 2/3
";
    assert_eq!(buf.contents(), expected);
}

#[test]
fn all_passing_run_succeeds() {
    let (runner, buf) = buffered();
    let res = runner.run(|t| {
        t.plan(3);
        t.pass("one");
        t.subtest("two", |t| {
            t.pass("inner");
        });
        t.ok(true, "three");
    });
    assert!(res);
    assert_eq!(
        buf.lines(),
        vec![
            "1..3",
            "ok 1 - one",
            "# Subtest: two",
            "  1..0",
            "  ok 1 - inner",
            "ok 2 - two",
            "ok 3 - three",
        ]
    );
}

#[test]
fn failure_inside_matching_plan_still_fails() {
    let (runner, buf) = buffered();
    let res = runner.run(|t| {
        t.plan(2);
        t.pass("a");
        t.fail("b");
    });
    assert!(!res);
    assert_eq!(buf.lines().last().unwrap(), "# Tests failed: 1/2");
    assert!(!buf.contents().contains("Planned"));
}

#[test]
fn guarded_check_output_becomes_diagnostics() {
    let (runner, buf) = buffered();
    let res = runner.run(|t| {
        t.subtest("captured", |t| {
            t.check_captured(
                |out| {
                    writeln!(out, "hello").unwrap();
                    writeln!(out).unwrap();
                    write!(out, "world").unwrap();
                    true
                },
                "z",
            );
        });
    });
    assert!(res);
    assert_eq!(
        buf.lines(),
        vec![
            "# Subtest: captured",
            "  1..0",
            "  ok 1 - z",
            "  # hello",
            "  # world",
            "ok 1 - captured",
        ]
    );
}

#[test]
fn panicking_check_fails_only_itself() {
    let (runner, buf) = buffered();
    let res = runner.run(|t| {
        t.subtest("panics", |t| {
            t.check_captured(|_| panic!("index out of bounds"), "explodes");
            t.pass("still running");
        });
    });
    assert!(!res);
    assert_eq!(
        buf.lines(),
        vec![
            "# Subtest: panics",
            "  1..0",
            "  not ok 1 - explodes",
            "  ok 2 - still running",
            "  # Tests failed: 1/2",
            "not ok 1 - panics",
            "# Tests failed: 1/1",
        ]
    );
}

#[test]
fn concurrent_checks_on_one_scope() {
    let (runner, buf) = buffered();
    let res = runner.run(|t| {
        t.subtest("parallel", |t| {
            std::thread::scope(|s| {
                for w in 0..4 {
                    s.spawn(move || {
                        for i in 0..25 {
                            t.check_captured(
                                |out| {
                                    writeln!(out, "worker {} item {}", w, i).unwrap();
                                    true
                                },
                                &format!("w{}-{}", w, i),
                            );
                        }
                    });
                }
            });
        });
    });
    assert!(res);

    let lines = buf.lines();
    let mut seqs: Vec<usize> = lines
        .iter()
        .filter_map(|l| l.strip_prefix("  ok "))
        .map(|rest| rest.split(' ').next().unwrap().parse().unwrap())
        .collect();
    let printed = seqs.clone();
    seqs.sort_unstable();
    assert_eq!(printed, seqs, "result lines out of numeric order");
    assert_eq!(seqs, (1..=100).collect::<Vec<_>>());
    assert_eq!(lines.last().unwrap(), "ok 1 - parallel");
}

#[test]
fn output_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.tap");
    let runner = Runner::new(RunConfig {
        output: Output::file(&path).unwrap(),
        version_header: true,
    });
    let res = runner.try_run(|t| {
        t.skip("slow", "not in CI");
        t.todo(false, "later", "tracked");
    });
    assert!(res.unwrap());
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "TAP version 14\n1..0\nok 1 - slow # SKIP not in CI\nnot ok 2 - later # TODO tracked\n"
    );
}

#[test]
fn output_file_in_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("results.tap");
    let err = Output::file(&path).unwrap_err();
    assert!(err.is_io());
    assert_eq!(err.path.as_deref(), Some(path.as_path()));
}

#[test]
fn broken_sink_fails_the_run() {
    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let runner = tap_reporter::builder()
        .output(Output::from_writer(Closed))
        .build();
    let err = runner.try_run(|t| {
        t.pass("unseen");
    });
    assert!(err.unwrap_err().is_io());

    let runner = tap_reporter::builder()
        .output(Output::from_writer(Closed))
        .build();
    assert!(!runner.run(|t| {
        t.pass("unseen");
    }));
}

#[test]
fn run_and_assert_passes() {
    tap_reporter::run_and_assert(|t| {
        t.is(2 + 2, 4, "sum");
    });
}

#[test]
#[should_panic(expected = "TAP run failed")]
fn run_and_assert_panics_on_failure() {
    tap_reporter::run_and_assert(|t| {
        t.fail("always");
    });
}

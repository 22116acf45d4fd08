use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Duration;

fn minish(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_minish"))
        .args(args)
        .output()
        .expect("failed to run minish")
}

fn minish_with_stdin(input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_minish"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run minish");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn inline_exit_status() {
    assert_eq!(minish(&["-c", "exit 3"]).status.code(), Some(3));
    assert_eq!(minish(&["-c", "exit 257"]).status.code(), Some(1));
    assert_eq!(minish(&["-c", "echo done"]).status.code(), Some(0));
}

#[test]
fn inline_positional_arguments() {
    let output = minish(&["-c", "echo $1-$2 $#", "a", "b"]);
    assert_eq!(stdout(&output), "a-b 2\n");
}

#[test]
fn missing_option_value_is_a_usage_error() {
    let output = minish(&["-c"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!stderr(&output).is_empty());
}

#[test]
fn help_exits_zero() {
    let output = minish(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("--ast-print"));
}

#[test]
fn missing_script_is_127() {
    let output = minish(&["/nonexistent/minish/script.sh"]);
    assert_eq!(output.status.code(), Some(127));
    assert!(stderr(&output).contains("/nonexistent/minish/script.sh"));
}

#[test]
fn script_with_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("greet.sh");
    fs::write(&script, "greeting=hello\necho $greeting $1\necho x | true\necho unreachable\n").unwrap();

    let script = script.to_str().unwrap();
    let output = minish(&[script, "world"]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout(&output), "hello world\n");
    assert!(stderr(&output).contains("unexpected token `|`"));
}

#[test]
fn syntax_error_in_inline_command() {
    let output = minish(&["-c", "echo a; ; echo b"]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("syntax error"));
}

#[test]
fn ast_print_comes_before_output() {
    let output = minish(&["--ast-print", "-c", "x=1 echo hi"]);
    assert_eq!(
        stdout(&output),
        "simple command\n  assign x=1\n  argv[0] echo\n  argv[1] hi\nhi\n"
    );
}

#[test]
fn piped_stdin_keeps_going_after_errors() {
    let output = minish_with_stdin("x=1\necho 'a\necho $x\nnot_a_command_for_minish\necho $?\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "1\n127\n");
    let err = stderr(&output);
    assert!(err.contains("unterminated single quote"));
    assert!(err.contains("not_a_command_for_minish: command not found"));
}

#[test]
fn piped_stdin_exit() {
    let output = minish_with_stdin("echo one\nexit 4\necho two\n");
    assert_eq!(output.status.code(), Some(4));
    assert_eq!(stdout(&output), "one\n");
}

#[test]
#[cfg(unix)]
fn external_programs_share_stdout() {
    let output = minish(&["-c", "echo a; sh -c 'echo b'; echo c"]);
    assert_eq!(stdout(&output), "a\nb\nc\n");
}

#[test]
fn negative_exit_status_wraps() {
    assert_eq!(minish(&["-c", "exit -1; echo unreachable"]).status.code(), Some(255));
}

#[test]
fn echo_prints_dash_words() {
    let output = minish(&["-c", "echo -x --help; echo -n a; echo b"]);
    assert_eq!(stdout(&output), "-x --help\nab\n");
    assert_eq!(stderr(&output), "");
}

#[test]
fn script_line_continuation() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("cont.sh");
    fs::write(&script, "echo a \\\nb\necho 'c\nd'\n").unwrap();

    let output = minish(&[script.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "a b\nc\nd\n");
    assert_eq!(stderr(&output), "");
}

#[test]
#[cfg(unix)]
fn interrupt_does_not_end_the_session() {
    let child = Command::new(env!("CARGO_BIN_EXE_minish"))
        .args(["-c", "sleep 1; echo after"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run minish");

    thread::sleep(Duration::from_millis(300));
    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("failed to run kill");
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "after\n");
    assert!(stderr(&output).contains("received SIGINT"));
}

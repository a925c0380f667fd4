use std::{
    fs,
    thread,
    time::{Duration, Instant},
};

use mush::{
    error::ErrorKind,
    execution::process::{EXEC_FAILURE_STATUS, REDIRECT_FAILURE_STATUS},
    result::CommandResult,
};
use nix::sys::signal::{Signal, kill};

use crate::common::{read_file, run_in, scratch_dir, session};

mod common;

#[test]
fn output_redirection() {
    let dir = scratch_dir("mush-tests-output");
    let mut env = session();

    run_in(&mut env, dir.path(), "echo hello   world > {}/out");
    assert_eq!(read_file(&dir.path().join("out")), "hello world\n");

    run_in(&mut env, dir.path(), "echo again >> {}/out");
    assert_eq!(read_file(&dir.path().join("out")), "hello world\nagain\n");

    run_in(&mut env, dir.path(), "echo replaced > {}/out");
    assert_eq!(read_file(&dir.path().join("out")), "replaced\n");
    assert_eq!(env.last_status, Some(0));
}

#[test]
fn input_redirection() {
    let dir = scratch_dir("mush-tests-input");
    fs::write(dir.path().join("in"), "from a file\n").unwrap();
    let mut env = session();

    run_in(&mut env, dir.path(), "cat < {}/in > {}/out");
    assert_eq!(read_file(&dir.path().join("out")), "from a file\n");
}

#[test]
fn pipe_delivers_output() {
    let dir = scratch_dir("mush-tests-pipe");
    let mut env = session();

    run_in(&mut env, dir.path(), "echo hello world | tr a-z A-Z > {}/out");
    assert_eq!(read_file(&dir.path().join("out")), "HELLO WORLD\n");
}

#[test]
fn pipeline_of_three() {
    let dir = scratch_dir("mush-tests-pipeline");
    let mut env = session();

    run_in(&mut env, dir.path(), r"printf 'b\na\nc\n' | sort | head -n 1 > {}/out");
    assert_eq!(read_file(&dir.path().join("out")), "a\n");
}

#[test]
fn long_output_through_pipe() {
    let dir = scratch_dir("mush-tests-long-pipe");
    let mut env = session();

    run_in(&mut env, dir.path(), "seq 1 200000 | wc -l > {}/out");
    assert_eq!(read_file(&dir.path().join("out")).trim(), "200000");
}

#[test]
fn redirection_overrides_pipe() {
    let dir = scratch_dir("mush-tests-override");
    fs::write(dir.path().join("in"), "file wins\n").unwrap();
    let mut env = session();

    run_in(&mut env, dir.path(), "echo pipe loses | cat < {}/in > {}/out");
    assert_eq!(read_file(&dir.path().join("out")), "file wins\n");
}

#[test]
fn sequential_commands_run_in_order() {
    let dir = scratch_dir("mush-tests-sequence");
    let mut env = session();

    run_in(&mut env, dir.path(), "echo one > {}/out; echo two >> {}/out;echo three >> {}/out");
    assert_eq!(read_file(&dir.path().join("out")), "one\ntwo\nthree\n");
}

#[test]
fn piped_builtin_runs_in_child() {
    let dir = scratch_dir("mush-tests-piped-builtin");
    let mut env = session();

    run_in(&mut env, dir.path(), "pwd | cat > {}/out");
    let expected = format!("{}\n", std::env::current_dir().unwrap().display());
    assert_eq!(read_file(&dir.path().join("out")), expected);
}

#[test]
fn builtin_in_child_leaves_session_alone() {
    let dir = scratch_dir("mush-tests-child-builtin");
    let mut env = session();

    run_in(&mut env, dir.path(), "prompt changed > {}/out");
    assert_eq!(env.prompt(), "% ");
    assert_eq!(read_file(&dir.path().join("out")), "");
}

#[test]
fn wildcards_expand() {
    let dir = scratch_dir("mush-tests-glob");
    for name in ["b.txt", "a.txt", "skip.log"] {
        fs::write(dir.path().join(name), "").unwrap();
    }
    let mut env = session();

    run_in(&mut env, dir.path(), "echo {}/*.txt {}/*.none > {}/out");
    let base = dir.path().display();
    assert_eq!(
        read_file(&dir.path().join("out")),
        format!("{base}/a.txt {base}/b.txt {base}/*.none\n")
    );
}

#[test]
fn exec_failure_is_confined_to_the_child() {
    let dir = scratch_dir("mush-tests-exec-failure");
    let mut env = session();

    let ret = run_in(&mut env, dir.path(), "mush-no-such-program-xyz a b; echo after > {}/out");
    assert_eq!(ret, CommandResult::Normal);
    assert_eq!(read_file(&dir.path().join("out")), "after\n");

    run_in(&mut env, dir.path(), "mush-no-such-program-xyz");
    assert_eq!(env.last_status, Some(EXEC_FAILURE_STATUS));
    assert_eq!(env.errors.kind(), ErrorKind::None);
}

#[test]
fn failed_redirection_is_confined_to_the_child() {
    let dir = scratch_dir("mush-tests-redirect-failure");
    let mut env = session();

    run_in(&mut env, dir.path(), "cat < {}/missing");
    assert_eq!(env.last_status, Some(REDIRECT_FAILURE_STATUS));
    assert_eq!(env.errors.kind(), ErrorKind::None);

    run_in(&mut env, dir.path(), "echo x > {}/no/such/dir/out; echo after > {}/out");
    assert_eq!(read_file(&dir.path().join("out")), "after\n");
}

#[test]
fn exit_status_is_recorded() {
    let dir = scratch_dir("mush-tests-status");
    let mut env = session();

    run_in(&mut env, dir.path(), "sh -c 'exit 3'");
    assert_eq!(env.last_status, Some(3));
    run_in(&mut env, dir.path(), "true");
    assert_eq!(env.last_status, Some(0));
}

#[test]
fn parse_error_runs_nothing() {
    let dir = scratch_dir("mush-tests-parse-error");
    let mut env = session();

    run_in(&mut env, dir.path(), "echo partial > {}/out; ls |");
    assert_eq!(env.errors.kind(), ErrorKind::Parse);
    assert!(env.errors.description().is_some());
    assert!(!dir.path().join("out").exists());

    run_in(&mut env, dir.path(), "echo fine > {}/out");
    assert_eq!(env.errors.kind(), ErrorKind::None);
    assert!(dir.path().join("out").exists());
}

#[test]
fn background_does_not_block() {
    let dir = scratch_dir("mush-tests-background");
    let mut env = session();

    let started = Instant::now();
    run_in(&mut env, dir.path(), "sleep 5 &");
    assert!(started.elapsed() < Duration::from_secs(4));

    assert_eq!(env.jobs.len(), 1);
    let pid = env.jobs.iter().next().unwrap().pid;
    let (position, job) = env.find_job(pid).unwrap();
    assert_eq!(position, 1);
    assert_eq!(job.command.path(), "sleep");

    kill(pid, Signal::SIGKILL).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut reaped = Vec::new();
    while reaped.is_empty() && Instant::now() < deadline {
        reaped = env.jobs.reap();
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(reaped.len(), 1);
    assert_eq!(reaped[0].0, 1);
    assert_eq!(reaped[0].1.pid, pid);
    assert!(env.jobs.is_empty());
}

#[test]
fn background_then_foreground() {
    let dir = scratch_dir("mush-tests-background-foreground");
    let mut env = session();

    run_in(&mut env, dir.path(), "sleep 5 & echo next > {}/out");
    assert_eq!(read_file(&dir.path().join("out")), "next\n");
    assert_eq!(env.jobs.len(), 1);

    let pid = env.jobs.iter().next().unwrap().pid;
    kill(pid, Signal::SIGKILL).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !env.jobs.is_empty() && Instant::now() < deadline {
        env.jobs.reap();
        thread::sleep(Duration::from_millis(20));
    }
    assert!(env.jobs.is_empty());
}

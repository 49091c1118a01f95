use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("matchcore"));
    cmd.arg("tests/fixtures/scenario.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "login_name,type,verified,swipes_today,purchases",
        ))
        .stdout(predicate::str::contains("ann,FREE,false,2,0"))
        .stdout(predicate::str::contains("bob,PREMIUM,true,0,1"))
        .stdout(predicate::str::contains("cat,PREMIUM,false,0,1"));

    Ok(())
}

#[test]
fn test_cli_keeps_going_after_rejected_commands() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "action, actor, target, detail").unwrap();
    writeln!(csv, "register, ann, Ann, hash").unwrap();
    writeln!(csv, "register, bob, Bob, hash").unwrap();
    writeln!(csv, "register, cat, Cat, hash").unwrap();
    writeln!(csv, "swipe, ann, bob, LIKE").unwrap();
    writeln!(csv, "swipe, ann, bob, LIKE").unwrap();
    writeln!(csv, "swipe, ann, cat, LIKE").unwrap();
    writeln!(csv, "teleport, ann, bob,").unwrap();
    writeln!(csv, "register, ann, Ann again, hash").unwrap();

    let mut cmd = Command::new(cargo_bin!("matchcore"));
    cmd.arg(csv.path()).arg("--max-swipes-per-day").arg("1");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ann,FREE,false,1,0"))
        .stdout(predicate::str::contains("Ann again").not())
        .stderr(predicate::str::contains("command rejected"))
        .stderr(predicate::str::contains("unreadable command"));
}

#[test]
fn test_cli_swipe_limit_from_environment() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "action, actor, target, detail").unwrap();
    writeln!(csv, "register, ann, Ann, hash").unwrap();
    writeln!(csv, "register, bob, Bob, hash").unwrap();
    writeln!(csv, "register, cat, Cat, hash").unwrap();
    writeln!(csv, "swipe, ann, bob, LIKE").unwrap();
    writeln!(csv, "swipe, ann, cat, LIKE").unwrap();

    let mut cmd = Command::new(cargo_bin!("matchcore"));
    cmd.arg(csv.path())
        .env("MATCHCORE_MAX_SWIPES_PER_DAY", "1");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ann,FREE,false,1,0"));
}

#[test]
fn test_cli_missing_input_fails() {
    let mut cmd = Command::new(cargo_bin!("matchcore"));
    cmd.arg("tests/fixtures/does-not-exist.csv");

    cmd.assert().failure();
}

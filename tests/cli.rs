#![forbid(unsafe_code)]
mod common;

use assert_cmd::Command;
use common::staff;
use gardes::Dataset;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_dataset(path: &Path, dataset: &Dataset) {
    fs::write(path, serde_json::to_vec_pretty(dataset).unwrap()).unwrap();
}

fn cli(data: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gardes-cli").unwrap();
    cmd.arg("--data").arg(data);
    cmd
}

#[test]
fn generate_then_check_and_list() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("planning.json");
    write_dataset(
        &data,
        &Dataset {
            personnel: staff(6),
            ..Dataset::default()
        },
    );

    cli(&data)
        .args([
            "generate",
            "--site",
            "chu-nord",
            "--start",
            "2025-03-03",
            "--end",
            "2025-03-09",
            "--gardes",
            "--astreintes",
            "--optimize",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Planning généré avec succès : 14 gardes/vacations créées",
        ))
        .stdout(predicate::str::contains("Équité :"));

    cli(&data)
        .args([
            "check",
            "--site",
            "chu-nord",
            "--start",
            "2025-03-03",
            "--end",
            "2025-03-09",
            "--gardes",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: no blocking conflicts"));

    let counts = dir.path().join("counts.csv");
    cli(&data)
        .args(["list", "--site", "chu-nord", "--start", "2025-03-03", "--end", "2025-03-09"])
        .arg("--counts-csv")
        .arg(&counts)
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-03-03 | garde | journée | mar-000"));
    let csv = fs::read_to_string(&counts).unwrap();
    assert!(csv.starts_with("person,guards,on_calls"));
}

#[test]
fn failed_generation_exits_with_code_2() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("planning.json");
    write_dataset(&data, &Dataset::default());

    cli(&data)
        .args([
            "generate",
            "--site",
            "chu-nord",
            "--start",
            "2025-03-03",
            "--end",
            "2025-03-04",
            "--gardes",
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("aucune affectation enregistrée"))
        .stderr(predicate::str::contains("2 jour(s) sans garde : 03/03, 04/03"));
}

#[test]
fn import_people_from_csv() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("planning.json");
    let people = dir.path().join("people.csv");
    fs::write(
        &people,
        "id,display_name,role,sites,active,leaves,work_days\n\
         alice,Alice,MAR,chu-nord,true,2025-03-10/2025-03-14,\n\
         bob,Bob,IADE,chu-nord;chu-sud,,,Mon;Tue\n",
    )
    .unwrap();

    cli(&data)
        .arg("import-people")
        .arg("--csv")
        .arg(&people)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 personne(s) importée(s)"));

    let stored: Dataset = serde_json::from_slice(&fs::read(&data).unwrap()).unwrap();
    assert_eq!(stored.personnel.len(), 2);
    assert_eq!(stored.personnel[1].sites.len(), 2);
}

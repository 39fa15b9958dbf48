// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! End-to-end checks of the command-line surface that need no cluster.

use assert_cmd::Command;
use predicates::prelude::*;

fn chatbot_deploy() -> Command {
    let mut cmd = Command::cargo_bin("chatbot-deploy").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("CHATBOT_MANIFEST_DIR")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_unknown_subcommand_prints_usage_and_exits_1() {
    chatbot_deploy()
        .arg("destroy")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_exits_0() {
    chatbot_deploy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"));
}

#[test]
fn test_deploy_without_kubectl_exits_1() {
    chatbot_deploy()
        .arg("deploy")
        .env("CHATBOT_KUBECTL_BIN", "kubectl-not-installed-0d9c")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("kubectl-not-installed-0d9c"))
        .stderr(predicate::str::contains("not installed"));
}

#[test]
fn test_status_without_kubectl_exits_1() {
    chatbot_deploy()
        .arg("status")
        .env("CHATBOT_KUBECTL_BIN", "kubectl-not-installed-0d9c")
        .assert()
        .code(1);
}

#[test]
fn test_build_without_docker_exits_1() {
    chatbot_deploy()
        .arg("build")
        .env("CHATBOT_DOCKER_BIN", "docker-not-installed-0d9c")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("docker-not-installed-0d9c"));
}

#[test]
fn test_all_without_docker_never_reaches_deploy() {
    chatbot_deploy()
        .env("CHATBOT_DOCKER_BIN", "docker-not-installed-0d9c")
        .env("CHATBOT_KUBECTL_BIN", "kubectl-not-installed-0d9c")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("docker-not-installed-0d9c"))
        .stderr(predicate::str::contains("kubectl-not-installed-0d9c").not());
}

#[test]
fn test_invalid_environment_exits_1() {
    chatbot_deploy()
        .arg("status")
        .env("CHATBOT_ROLLOUT_TIMEOUT_SECS", "soon")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CHATBOT_ROLLOUT_TIMEOUT_SECS"));
}

#[test]
fn test_render_dockerfile() {
    chatbot_deploy()
        .args(["render", "dockerfile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AS builder"))
        .stdout(predicate::str::contains(
            "HEALTHCHECK --interval=30s --timeout=10s --start-period=5s --retries=3",
        ));
}

#[test]
fn test_render_manifests_honours_flags() {
    chatbot_deploy()
        .args(["render", "manifests", "--namespace", "devops", "--image-tag", "v3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("namespace: devops"))
        .stdout(predicate::str::contains("image: devops-chatbot:v3"))
        .stdout(predicate::str::contains("kind: Service"));
}

#[test]
fn test_render_manifests_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("secret.yaml"),
        "apiVersion: v1\nkind: Secret\nmetadata:\n  name: custom-secrets\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("deployment.yaml"),
        "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: custom\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("service.yaml"),
        "apiVersion: v1\nkind: Service\nmetadata:\n  name: custom\n",
    )
    .unwrap();

    chatbot_deploy()
        .args(["render", "manifests", "--manifest-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("name: custom-secrets"));
}

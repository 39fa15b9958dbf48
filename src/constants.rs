// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Default names of the things being built and deployed
pub mod defaults {
    pub const IMAGE_NAME: &str = "devops-chatbot";
    pub const IMAGE_TAG: &str = "latest";
    /// Name shared by the deployment, the service and the `app` label
    pub const APP_NAME: &str = "devops-chatbot";
    pub const NAMESPACE: &str = "default";
    pub const BUILD_CONTEXT: &str = ".";
    /// Host used when printing the access URL of a NodePort service
    pub const ACCESS_HOST: &str = "localhost";
    pub const DOCKER_BIN: &str = "docker";
    pub const KUBECTL_BIN: &str = "kubectl";
}

/// Environment variables consulted by `Config::from_env`
pub mod env {
    pub const IMAGE_NAME: &str = "CHATBOT_IMAGE_NAME";
    pub const IMAGE_TAG: &str = "CHATBOT_IMAGE_TAG";
    pub const APP_NAME: &str = "CHATBOT_APP_NAME";
    pub const NAMESPACE: &str = "CHATBOT_NAMESPACE";
    pub const KUBE_CONTEXT: &str = "CHATBOT_KUBE_CONTEXT";
    pub const BUILD_CONTEXT: &str = "CHATBOT_BUILD_CONTEXT";
    pub const DOCKERFILE: &str = "CHATBOT_DOCKERFILE";
    pub const MANIFEST_DIR: &str = "CHATBOT_MANIFEST_DIR";
    pub const ROLLOUT_TIMEOUT_SECS: &str = "CHATBOT_ROLLOUT_TIMEOUT_SECS";
    pub const ACCESS_HOST: &str = "CHATBOT_ACCESS_HOST";
    pub const NODE_PORT: &str = "CHATBOT_NODE_PORT";
    pub const DOCKER_BIN: &str = "CHATBOT_DOCKER_BIN";
    pub const KUBECTL_BIN: &str = "CHATBOT_KUBECTL_BIN";

    /// Variables copied into the generated application secret when present
    pub const SECRET_KEYS: &[&str] = &["ANTHROPIC_API_KEY", "DATABASE_URL", "DB_PASSWORD"];
    /// The application refuses to answer chat requests without this one
    pub const REQUIRED_SECRET_KEY: &str = "ANTHROPIC_API_KEY";
}

/// Runtime image defaults
pub mod image {
    pub const BASE_IMAGE: &str = "python:3.11-slim";
    pub const VENV_PATH: &str = "/opt/venv";
    pub const REQUIREMENTS_FILE: &str = "requirements.txt";
    pub const WORKDIR: &str = "/app";
    pub const RUNTIME_USER: &str = "appuser";
    pub const RUNTIME_UID: u32 = 1000;
    pub const BIND_HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 8000;
    pub const ENTRYPOINT_MODULE: &str = "chatbot.main:app";
    pub const DESCRIPTION: &str = "DevOps Multi-Agent Chatbot with 42+ specialized agents";
    /// Compiler tooling installed only in the builder stage
    pub const BUILD_PACKAGES: &[&str] = &["gcc", "libpq-dev"];
}

/// Liveness probe schedule baked into the image and the deployment
pub mod health {
    pub const PATH: &str = "/api/health";
    pub const INTERVAL_SECS: u64 = 30;
    pub const TIMEOUT_SECS: u64 = 10;
    pub const START_PERIOD_SECS: u64 = 5;
    pub const RETRIES: u32 = 3;
}

/// Cluster resource naming
pub mod resources {
    pub const SECRET_SUFFIX: &str = "-secrets";
    pub const CONFIG_SUFFIX: &str = "-config";
    pub const SERVICE_PORT: i32 = 80;
    pub const APP_LABEL: &str = "app";
    pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
    pub const MANAGER_NAME: &str = "chatbot-deploy";

    pub const SECRET_FILE: &str = "secret.yaml";
    pub const DEPLOYMENT_FILE: &str = "deployment.yaml";
    pub const SERVICE_FILE: &str = "service.yaml";
}

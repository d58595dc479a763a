//! Token helper scripts invoked by kubeconfig exec plugins
//!
//! Each helper prints a `client.authentication.k8s.io/v1` ExecCredential
//! on stdout. The only inputs are the AAD application id and, for the
//! Windows direct-Azure helper, the managed identity client id and the
//! cloud kubelogin authenticates against.

use super::paths::WINDOWS_KUBELOGIN;

const ARC_TOKEN_URL: &str =
    "http://127.0.0.1:40342/metadata/identity/oauth2/token?api-version=2019-11-01&resource=";
const AZURE_TOKEN_URL: &str =
    "http://169.254.169.254/metadata/identity/oauth2/token?api-version=2018-02-01&resource=";

const EXEC_CREDENTIAL_JQ: &str = r#"EXECCREDENTIAL='''
{
  "kind": "ExecCredential",
  "apiVersion": "client.authentication.k8s.io/v1",
  "spec": {
    "interactive": false
  },
  "status": {
    "expirationTimestamp": .expires_on | tonumber | todate,
    "token": .access_token
  }
}
'''"#;

/// Azure Arc HIMDS helper for Linux
pub fn arc_token_sh(app_id: &str) -> String {
    format!(
        r#"#!/bin/bash

# Fetch an AAD token from Azure Arc HIMDS and print it as an ExecCredential

TOKEN_URL="{url}{app_id}"
{exec_credential}

# HIMDS answers the first request with the path of a root-only challenge file
CHALLENGE_TOKEN_PATH=$(curl -s -D - -H Metadata:true $TOKEN_URL | grep Www-Authenticate | cut -d "=" -f 2 | tr -d "[:cntrl:]")
CHALLENGE_TOKEN=$(cat $CHALLENGE_TOKEN_PATH)
if [ $? -ne 0 ]; then
    echo "Could not retrieve challenge token, double check that this command is run with root privileges."
    exit 255
fi

curl -s -H Metadata:true -H "Authorization: Basic $CHALLENGE_TOKEN" $TOKEN_URL | jq "$EXECCREDENTIAL"
"#,
        url = ARC_TOKEN_URL,
        app_id = app_id,
        exec_credential = EXEC_CREDENTIAL_JQ,
    )
}

/// Azure Arc HIMDS helper for Windows
pub fn arc_token_ps1(app_id: &str) -> String {
    format!(
        r#"$ErrorActionPreference = "Stop"

$TOKEN_URL = "{url}{app_id}"
$HEADERS = @{{
  'Metadata' = 'true'
}}

# HIMDS rejects the first request and names a challenge file only administrators can read
try {{
  Invoke-WebRequest -Method GET -Headers $HEADERS -Uri $TOKEN_URL -UseBasicParsing | Out-Null
}} catch {{
  $WWW_AUTHENTICATE = $_.Exception.Response.Headers["WWW-Authenticate"]
}}

if (-not $WWW_AUTHENTICATE) {{
  Write-Error "Could not retrieve challenge token path, double check that this command is run as administrator."
  exit 255
}}

$CHALLENGE_TOKEN_PATH = $WWW_AUTHENTICATE.Split("=")[1].Trim()
$CHALLENGE_TOKEN = Get-Content -Raw $CHALLENGE_TOKEN_PATH
$HEADERS['Authorization'] = "Basic $CHALLENGE_TOKEN"

$RESULT = Invoke-WebRequest -Method GET -Headers $HEADERS -Uri $TOKEN_URL -UseBasicParsing
$CONTENT = $RESULT.Content | ConvertFrom-Json
$EXPIRES_ON = Get-Date -AsUTC -Format "o" (Get-Date 01.01.1970).AddSeconds($CONTENT.expires_on)

$EXECCREDENTIAL = @{{
  'kind' = 'ExecCredential'
  'apiVersion' = 'client.authentication.k8s.io/v1'
  'spec' = @{{
    'interactive' = $False
  }}
  'status' = @{{
    'expirationTimestamp' = $EXPIRES_ON
    'token' = $CONTENT.access_token
  }}
}}

$EXECCREDENTIAL | ConvertTo-Json -Depth 4
"#,
        url = ARC_TOKEN_URL,
        app_id = app_id,
    )
}

/// Azure IMDS helper for Linux
pub fn azure_token_sh(app_id: &str) -> String {
    format!(
        r#"#!/bin/bash

TOKEN_URL="{url}{app_id}"
{exec_credential}

curl -s -H Metadata:true $TOKEN_URL | jq "$EXECCREDENTIAL"
"#,
        url = AZURE_TOKEN_URL,
        app_id = app_id,
        exec_credential = EXEC_CREDENTIAL_JQ,
    )
}

/// Windows direct-Azure helper: a single kubelogin invocation
pub fn azure_token_ps1(app_id: &str, client_id: &str, environment: &str) -> String {
    format!(
        "{} get-token --environment {} --server-id {} --login msi --client-id {}",
        WINDOWS_KUBELOGIN, environment, app_id, client_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::constants::DEFAULT_AAD_APP_ID;

    #[test]
    fn test_arc_helper_targets_himds() {
        let script = arc_token_sh(DEFAULT_AAD_APP_ID);
        assert!(script.starts_with("#!/bin/bash"));
        assert!(script.contains(&format!(
            "127.0.0.1:40342/metadata/identity/oauth2/token?api-version=2019-11-01&resource={}",
            DEFAULT_AAD_APP_ID
        )));
        assert!(script.contains("exit 255"));
        assert!(script.contains(r#"jq "$EXECCREDENTIAL""#));
    }

    #[test]
    fn test_azure_helper_targets_imds() {
        let script = azure_token_sh("app");
        assert!(script.contains("169.254.169.254/metadata/identity/oauth2/token?api-version=2018-02-01&resource=app\""));
        assert!(!script.contains("CHALLENGE_TOKEN"));
    }

    #[test]
    fn test_windows_helpers() {
        assert_eq!(
            azure_token_ps1("app", "client", "AzurePublicCloud"),
            r"c:\k\kubelogin.exe get-token --environment AzurePublicCloud --server-id app --login msi --client-id client"
        );
        assert!(azure_token_ps1("app", "client", "AzureChinaCloud")
            .contains("--environment AzureChinaCloud --server-id app"));

        let arc = arc_token_ps1("app");
        assert!(arc.contains("$TOKEN_URL = \"http://127.0.0.1:40342/"));
        assert!(arc.contains("resource=app\""));
        assert!(arc.contains("ConvertTo-Json"));
    }
}

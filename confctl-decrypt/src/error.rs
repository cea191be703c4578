error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    foreign_links {
        Io(::std::io::Error);
        SerdeJ(serde_json::Error);
        Reqw(reqwest::Error);
    }
    errors {
        MissingVaultAddr {
            description("VAULT_ADDR not specified")
            display("VAULT_ADDR not specified")
        }
        MissingVaultToken {
            description("VAULT_TOKEN not specified")
            display("VAULT_TOKEN not specified")
        }
        NoHomeDirectory {
            description("can't find home directory")
            display("can't find home directory")
        }
        UnexpectedHttpStatus(status: u16) {
            description("unexpected HTTP status from the secret store")
            display("unexpected HTTP status: {}", status)
        }
        /// §7 `decrypt-failed`, tagged with the originating path (§4.3)
        DecryptFailed(path: String, cause: String) {
            description("ciphertext could not be decoded")
            display("decrypt failed at '{}': {}", path, cause)
        }
    }
}

error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    foreign_links {
        Io(::std::io::Error);
        Tree(confctl_filetree::Error);
    }
    errors {
        SubprocessFailure(cmd: String, code: i32) {
            description("git subprocess failed")
            display("subprocess failure from git ({}): exit code {}", cmd, code)
        }
        MissingAuth(owner: String, name: String) {
            description("repository has neither a token nor an ssh key configured")
            display("repository {}/{} has no authentication configured", owner, name)
        }
        /// §4.5: customer contents under `default/` or `include/` collide
        /// with the shared overlay being moved into the same slot.
        OverlayCollision(path: String) {
            description("customer and shared repository both provide the same path")
            display("overlay-collision: {}", path)
        }
    }
}

error_chain! {
    foreign_links {
        Psy(confctl_psy::Error);
        Template(confctl_template::Error);
        Decrypt(confctl_decrypt::Error);
        Tree(confctl_filetree::Error);
        Repo(confctl_repo::Error);
        Generator(confctl_generator::Error);
        Lint(confctl_lint::Error);
        Reconcile(confctl_reconcile::Error);
        Io(std::io::Error);
    }

    errors {
        MissingApp(app: String) {
            description("unknown app")
            display("app '{}' not found under default/apps", app)
        }
    }
}

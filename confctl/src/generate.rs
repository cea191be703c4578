//! `confctl generate`: runs the 7-step composition pipeline for one
//! `(installation, app)` pair against a local checkout and prints the
//! resulting artifact pair (§4.4).

use confctl_decrypt::{Decrypter, NullDecrypter, VaultDecrypter};
use confctl_filetree::FileTree;

use crate::error::Result;

pub struct GenerateOptions {
    pub dir: String,
    pub installation: String,
    pub app: String,
    /// When `None`, ciphertext leaves are left for the caller to fill in
    /// out of band rather than resolved against a real secret store.
    pub vault_transit_key: Option<String>,
}

pub fn run(opts: &GenerateOptions) -> Result<()> {
    let tree = FileTree::from_dir(&opts.dir)?;
    let library = crate::load_include_library(&tree)?;

    let decrypter: Box<dyn Decrypter> = match &opts.vault_transit_key {
        Some(key) => Box::new(VaultDecrypter::from_env(key)?),
        None => Box::new(NullDecrypter),
    };

    let raw = confctl_generator::generate(&tree, &opts.installation, &opts.app, decrypter.as_ref(), &library)?;

    println!("# configmap-values.yaml");
    println!("{}", raw.values);
    println!("# secret-values.yaml");
    println!("{}", raw.secrets);
    Ok(())
}

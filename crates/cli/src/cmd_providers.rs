use {
    crate::{Executable, args},
    anyhow::Result,
    clap::Args as ClapArgs,
    pubip::KnownProvider,
    strum::VariantArray,
};

/// The list of options for the "providers" command.
#[derive(ClapArgs)]
pub struct Args {}

impl Executable for Args {
    fn setup(self) -> Result<Self> {
        Ok(self)
    }

    // Prints the built-in providers, one per line, in the order they're asked.
    async fn run(self, _: &args::Global) -> Result<()> {
        for known in KnownProvider::VARIANTS {
            let name: &'static str = known.into();
            println!("{:<14} {}  {}", name, known.family(), known.request_uri());
        }
        Ok(())
    }
}

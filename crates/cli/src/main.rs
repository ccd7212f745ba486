mod app;
mod args;
mod cmd_lookup;
mod cmd_providers;

pub(crate) use app::Executable;

fn main() {
    app::exec()
}

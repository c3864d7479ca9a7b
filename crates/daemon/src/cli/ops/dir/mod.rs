use clap::{Args, Subcommand};

pub mod create;
pub mod ls;
pub mod show;

use crate::cli::op::Op;

crate::command_enum! {
    (Create, create::Create),
    (Ls, ls::Ls),
    (Show, show::Show),
}

pub type DirCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Dir {
    #[command(subcommand)]
    pub command: DirCommand,
}

#[async_trait::async_trait]
impl Op for Dir {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

fn format_directory(dir: &varsity_daemon::http_server::api::v0::directories::DirectoryInfo) -> String {
    match dir.subdirectory_type {
        Some(kind) => format!(
            "{} {} [{}] ({}, {} resources)",
            dir.id, dir.course_code, kind, dir.visibility, dir.resource_count
        ),
        None => format!(
            "{} {} {} ({}, {} resources)",
            dir.id, dir.course_code, dir.title, dir.visibility, dir.resource_count
        ),
    }
}

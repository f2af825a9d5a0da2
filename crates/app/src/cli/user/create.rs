use clap::Args;
use stride_app::{
    auth::PgAuthService,
    domain::users::{
        PgUsersService, UsersService,
        data::NewUser,
        records::UserUuid,
    },
};

use crate::cli::DatabaseArgs;

#[derive(Debug, Args)]
pub(crate) struct CreateUserArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Customer email address
    #[arg(long)]
    email: String,

    /// Also issue a non-expiring API token for the new customer
    #[arg(long)]
    issue_token: bool,
}

pub(crate) async fn run(args: CreateUserArgs) -> Result<(), String> {
    let db = args.database.connect().await?;

    let user = PgUsersService::new(db.pool().clone())
        .create_user(NewUser {
            uuid: UserUuid::new(),
            email: args.email,
        })
        .await
        .map_err(|error| format!("failed to create user: {error}"))?;

    println!("user_uuid: {}", user.uuid);
    println!("email: {}", user.email);

    if args.issue_token {
        let issued = PgAuthService::new(db.pool().clone())
            .issue_api_token(user.uuid, None)
            .await
            .map_err(|error| format!("failed to create token: {error}"))?;

        println!("token_uuid: {}", issued.metadata.uuid);
        println!("api_token: {}", issued.token);
        println!("store this token now; it is only shown once");
    }

    Ok(())
}

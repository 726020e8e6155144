use anyhow::Result;
use clap::{Parser, Subcommand};
use reqwest::{Client, Method, Response};
use serde_json::{Value, json};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of a running server
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a registration, defaults to a sample attendee
    Register {
        #[arg(long, default_value = "a@x.com")]
        email: String,

        #[arg(long, default_value = "Jane Doe")]
        full_name: String,

        #[arg(long, default_value = "+234 801 234 5678")]
        phone_number: String,

        #[arg(long, default_value = "X School")]
        school_name: String,

        #[arg(long, default_value = "Proprietor")]
        position: String,

        #[arg(long, default_value = "Ila")]
        lga_town: String,

        #[arg(long, default_value = "WhatsApp Group")]
        how_heard: String,
    },

    /// Look up the access code for an email
    Lookup { email: String },

    /// Send a preflight to the notification endpoint
    Preflight,

    /// Register, register again, then look up, checking each status
    Scenario {
        #[arg(long, default_value = "a@x.com")]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = Client::new();
    let base = args.url.trim_end_matches('/');

    match args.command {
        Command::Register {
            email,
            full_name,
            phone_number,
            school_name,
            position,
            lga_town,
            how_heard,
        } => {
            let form = json!({
                "email": email,
                "fullName": full_name,
                "phoneNumber": phone_number,
                "schoolName": school_name,
                "position": position,
                "lgaTown": lga_town,
                "howHeard": how_heard,
            });

            print(register(&client, base, &form).await?).await?;
        }
        Command::Lookup { email } => {
            print(lookup(&client, base, &email).await?).await?;
        }
        Command::Preflight => {
            let res = client
                .request(Method::OPTIONS, format!("{base}/notifications/registration"))
                .header("Origin", "http://localhost")
                .header("Access-Control-Request-Method", "POST")
                .send()
                .await?;

            println!("Status: {}", res.status());
            for (name, value) in res.headers() {
                println!("{name}: {}", value.to_str().unwrap_or("<binary>"));
            }
        }
        Command::Scenario { email } => scenario(&client, base, &email).await?,
    }

    Ok(())
}

async fn register(client: &Client, base: &str, form: &Value) -> Result<Response> {
    Ok(client
        .post(format!("{base}/registrations"))
        .json(form)
        .send()
        .await?)
}

async fn lookup(client: &Client, base: &str, email: &str) -> Result<Response> {
    Ok(client
        .get(format!("{base}/access-code"))
        .query(&[("email", email)])
        .send()
        .await?)
}

async fn print(res: Response) -> Result<Value> {
    let status = res.status();
    let body: Value = res.json().await?;

    println!("Status: {status}");
    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(body)
}

async fn scenario(client: &Client, base: &str, email: &str) -> Result<()> {
    let form = json!({
        "email": email,
        "fullName": "Jane Doe",
        "phoneNumber": "+234 801 234 5678",
        "schoolName": "X School",
        "position": "Proprietor",
        "lgaTown": "Ila",
        "howHeard": "WhatsApp Group",
    });

    println!("First registration");
    let first = print(register(client, base, &form).await?).await?;
    anyhow::ensure!(first["status"] == "success", "expected success");

    println!("\nSecond registration");
    let second = print(register(client, base, &form).await?).await?;
    anyhow::ensure!(second["status"] == "duplicate", "expected duplicate");

    println!("\nLookup");
    let found = print(lookup(client, base, &format!(" {} ", email.to_uppercase())).await?).await?;
    anyhow::ensure!(
        found["accessCode"] == first["accessCode"],
        "lookup returned a different code"
    );

    println!("\nScenario passed");

    Ok(())
}

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "storefront", version, about = "Module-bundle storefront checkout")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        env = "STOREFRONT_BACKEND_URL",
        help = "Backend API base URL"
    )]
    pub backend_url: Option<String>,
    #[arg(
        long,
        global = true,
        env = "STOREFRONT_ORIGIN_URL",
        help = "Storefront origin the payment page returns to"
    )]
    pub origin_url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the packages on sale
    Catalog,
    /// Fill the form and create a payment session
    Checkout(CheckoutArgs),
    /// Continue from the URL the payment page redirected to
    Resume {
        return_url: String,
    },
    /// Run the whole flow against an in-memory backend
    Demo,
}

#[derive(Args, Debug)]
pub struct CheckoutArgs {
    #[arg(long, help = "Package id (starter, premium, dsa_express)")]
    pub package: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub skills: String,
    #[arg(long)]
    pub passion: String,
    #[arg(long, help = "2-5 heures, 5-10 heures, 10-20 heures or 20+ heures")]
    pub weekly_time: String,
    #[arg(long, help = "500-1000€, 1000-3000€, 3000-5000€ or 5000€+")]
    pub income: String,
    #[arg(long, help = "Débutant or Confirmé")]
    pub experience: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checkout() {
        let cli = Cli::try_parse_from([
            "storefront",
            "--json",
            "checkout",
            "--package",
            "starter",
            "--name",
            "Léa",
            "--email",
            "lea@example.com",
            "--skills",
            "Vente",
            "--passion",
            "Yoga",
            "--weekly-time",
            "5-10 heures",
            "--income",
            "1000-3000€",
            "--experience",
            "Débutant",
        ])
        .unwrap();

        assert!(cli.json);
        let Commands::Checkout(args) = cli.command else {
            panic!("expected checkout");
        };
        assert_eq!(args.package, "starter");
        assert_eq!(args.weekly_time, "5-10 heures");
    }

    #[test]
    fn test_parse_resume_with_global_flag_after_command() {
        let cli = Cli::try_parse_from([
            "storefront",
            "resume",
            "https://shop.example/?session_id=cs_1",
            "--backend-url",
            "http://api.local/api",
        ])
        .unwrap();

        assert_eq!(cli.backend_url.as_deref(), Some("http://api.local/api"));
        assert!(matches!(
            cli.command,
            Commands::Resume { ref return_url } if return_url.ends_with("cs_1")
        ));
    }

    #[test]
    fn test_checkout_requires_package() {
        assert!(Cli::try_parse_from(["storefront", "checkout", "--name", "Léa"]).is_err());
    }
}

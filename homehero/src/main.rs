use anyhow::Context;
use clap::{Parser, Subcommand};
use homehero::models::{BookingRequest, BookingStatus, NewReview, NewService, ServiceUpdate};
use homehero::{render, HomeHero, ServiceFilters, Settings, SortOrder};
use homehero_common::catalog::find_category;
use homehero_http::{ClientConfig, HomeHeroError, Identity, SyncState};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "homehero")]
#[command(about = "HomeHero service marketplace client")]
struct Cli {
    /// Backend origin (overrides HOMEHERO_API_URL and the saved config)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Data directory (overrides HOMEHERO_ROOT and the saved config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and exchange the identity for a backend token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        photo: Option<String>,
    },
    /// Create an account and sign it in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        photo: Option<String>,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Change display name or photo
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        photo: Option<String>,
    },
    #[command(subcommand)]
    Services(ServicesCommand),
    #[command(subcommand)]
    Bookings(BookingsCommand),
    #[command(subcommand)]
    Reviews(ReviewsCommand),
    /// Provider dashboard numbers
    Stats,
}

#[derive(Subcommand)]
enum ServicesCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        min_price: Option<String>,
        #[arg(long)]
        max_price: Option<String>,
        #[arg(long)]
        sort: Option<SortOrder>,
        /// Raw query string, e.g. "category=plumbing&sortBy=rating"
        #[arg(long)]
        query: Option<String>,
    },
    Featured {
        #[arg(long, default_value = "6")]
        limit: u32,
    },
    TopRated {
        #[arg(long, default_value = "6")]
        limit: u32,
    },
    Show {
        id: String,
    },
    /// Services offered by the signed-in user
    Mine,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum BookingsCommand {
    Create {
        service_id: String,
        /// Booking date, YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "")]
        instructions: String,
    },
    /// Bookings made by the signed-in user
    Mine,
    /// Bookings received for the signed-in user's services
    Provider,
    Cancel {
        id: String,
    },
    Status {
        id: String,
        status: BookingStatus,
    },
}

#[derive(Subcommand)]
enum ReviewsCommand {
    Add {
        service_id: String,
        #[arg(long)]
        rating: u8,
        #[arg(long, default_value = "")]
        comment: String,
    },
}

fn init_tracing(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(log_dir, "homehero.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "homehero=info,homehero_http=info,warn".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let root = cli.data_dir.clone().unwrap_or_else(homehero_common::data_root);
    let root = homehero_common::init_structure(&root).context("Failed to initialize data directory")?;
    let guard = init_tracing(&homehero_common::logs_dir(&root));

    let saved = homehero_common::load_config();
    let mut client = ClientConfig::from_env();
    if let Some(url) = cli.api_url.clone().or_else(homehero_common::configured_api_url) {
        client.base_url = url;
    }
    let mut settings = Settings::new(client, homehero_common::session_path(&root));
    if let Some(route) = saved.login_route {
        settings = settings.with_login_route(route);
    }
    info!(api = %settings.client.base_url, data = ?root, "Starting HomeHero");

    let app = HomeHero::start(settings).await?;
    let outcome = run(&app, cli.command).await;

    while let Some(redirect) = app.take_redirect() {
        eprintln!("{}", render::redirect(&redirect));
    }
    app.shutdown().await;

    if let Err(e) = outcome {
        match e.downcast_ref::<HomeHeroError>() {
            // The redirect above already told the user why.
            Some(api_err) if api_err.is_access_denied() => {}
            Some(api_err) => eprintln!("{}", api_err.user_message()),
            None => eprintln!("{:#}", e),
        }
        drop(guard);
        std::process::exit(1);
    }
    Ok(())
}

/// Signed-in user for `location`, printing the login redirect otherwise.
fn signed_in(app: &HomeHero, location: &str) -> Option<Identity> {
    match app.require_user(location) {
        Ok(user) => Some(user),
        Err(redirect) => {
            eprintln!("{}", render::redirect(&redirect.with_message("Please login first.")));
            None
        }
    }
}

async fn run(app: &HomeHero, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, name, photo } => {
            let mut identity = Identity::new(email);
            if let Some(name) = name {
                identity = identity.with_display_name(name);
            }
            if let Some(photo) = photo {
                identity = identity.with_photo_url(photo);
            }
            report_sign_in(app.sign_in(identity).await?);
        }
        Command::Register { email, name, photo } => {
            if !homehero_common::format::is_valid_email(&email) {
                anyhow::bail!("Please enter a valid email address");
            }
            let mut identity = Identity::new(email).with_display_name(name);
            if let Some(photo) = photo {
                identity = identity.with_photo_url(photo);
            }
            report_sign_in(app.register(identity).await?);
        }
        Command::Logout => {
            app.sign_out().await?;
            println!("Signed out.");
        }
        Command::Whoami => match app.current_user() {
            Some(user) => {
                println!("{}", render::identity(&user));
                println!("  token:        {}", if app.store().has_token() { "yes" } else { "no" });
            }
            None => println!("Not signed in."),
        },
        Command::Profile { name, photo } => {
            if signed_in(app, "/profile").is_none() {
                return Ok(());
            }
            let updated = app.update_profile(name, photo)?;
            println!("{}", render::identity(&updated));
        }
        Command::Services(cmd) => services(app, cmd).await?,
        Command::Bookings(cmd) => bookings(app, cmd).await?,
        Command::Reviews(ReviewsCommand::Add { service_id, rating, comment }) => {
            if signed_in(app, &format!("/services/{}", service_id)).is_none() {
                return Ok(());
            }
            let review = NewReview::new(rating, comment)?;
            app.api.add_review(&service_id, &review).await?;
            println!("Review added.");
        }
        Command::Stats => {
            let Some(user) = signed_in(app, "/profile") else {
                return Ok(());
            };
            let stats = app.api.user_stats(&user.email).await?;
            println!("{}", render::stats(&stats));
        }
    }
    Ok(())
}

fn report_sign_in(state: SyncState) {
    match state {
        SyncState::SignedIn { identity, has_token: true } => {
            println!("Signed in as {}.", identity.name());
        }
        SyncState::SignedIn { identity, has_token: false } => {
            println!(
                "Signed in as {}, but the server did not issue a session token.",
                identity.name()
            );
        }
        _ => println!("Not signed in."),
    }
}

async fn services(app: &HomeHero, cmd: ServicesCommand) -> anyhow::Result<()> {
    match cmd {
        ServicesCommand::List { search, category, min_price, max_price, sort, query } => {
            let mut filters = query.as_deref().map(ServiceFilters::from_query).unwrap_or_default();
            if let Some(search) = search {
                filters.search = search;
            }
            if let Some(category) = category {
                filters.category = category;
            }
            if let Some(min) = min_price {
                filters.min_price = min;
            }
            if let Some(max) = max_price {
                filters.max_price = max;
            }
            if let Some(sort) = sort {
                filters.sort_by = sort;
            }
            let services = app.api.list_services(&filters).await?;
            if services.is_empty() && filters.has_active_filters() {
                println!("No services match these filters.");
            }
            for service in &services {
                println!("{}", render::service_line(service));
            }
        }
        ServicesCommand::Featured { limit } => {
            for service in &app.api.featured_services(limit).await? {
                println!("{}", render::service_line(service));
            }
        }
        ServicesCommand::TopRated { limit } => {
            for service in &app.api.top_rated_services(limit).await? {
                println!("{}", render::service_line(service));
            }
        }
        ServicesCommand::Show { id } => {
            println!("{}", render::service_details(&app.api.service(&id).await?));
        }
        ServicesCommand::Mine => {
            let Some(user) = signed_in(app, "/my-services") else {
                return Ok(());
            };
            for service in &app.api.provider_services(&user.email).await? {
                println!("{}", render::service_line(service));
            }
        }
        ServicesCommand::Add { name, category, price, description, location, duration, image } => {
            let Some(user) = signed_in(app, "/add-service") else {
                return Ok(());
            };
            let category = find_category(&category)
                .map(|c| c.value.to_string())
                .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", category))?;
            let mut service = NewService::for_provider(&user, name, category, price, description);
            if let Some(location) = location {
                service = service.with_location(location);
            }
            if let Some(duration) = duration {
                service = service.with_duration(duration);
            }
            if let Some(image) = image {
                service = service.with_image_url(image);
            }
            service.validate()?;
            app.api.add_service(&service).await?;
            println!("Service added.");
        }
        ServicesCommand::Update { id, name, category, price, description, location, duration, image } => {
            let location_path = format!("/update-service/{}", id);
            let Some(user) = signed_in(app, &location_path) else {
                return Ok(());
            };
            let current = app.api.service(&id).await?;
            if !current.is_owned_by(&user.email) {
                anyhow::bail!("You can only update your own services");
            }
            let update = ServiceUpdate {
                service_name: name,
                category,
                price,
                description,
                image_url: image,
                location,
                duration,
            };
            if update.is_empty() {
                println!("Nothing to update.");
                return Ok(());
            }
            app.api.update_service(&id, &update).await?;
            println!("Service updated.");
        }
        ServicesCommand::Delete { id } => {
            let Some(user) = signed_in(app, "/my-services") else {
                return Ok(());
            };
            let current = app.api.service(&id).await?;
            if !current.is_owned_by(&user.email) {
                anyhow::bail!("You can only delete your own services");
            }
            app.api.delete_service(&id).await?;
            println!("Service deleted.");
        }
    }
    Ok(())
}

async fn bookings(app: &HomeHero, cmd: BookingsCommand) -> anyhow::Result<()> {
    match cmd {
        BookingsCommand::Create { service_id, date, instructions } => {
            let Some(user) = signed_in(app, &format!("/services/{}", service_id)) else {
                return Ok(());
            };
            if homehero_common::format::parse_date(&date).is_none() {
                anyhow::bail!("Booking date must look like YYYY-MM-DD");
            }
            let service = app.api.service(&service_id).await?;
            if service.is_owned_by(&user.email) {
                anyhow::bail!("You cannot book your own service");
            }
            let request = BookingRequest::new(&service, &user, date).with_instructions(instructions);
            app.api.create_booking(&request).await?;
            println!("Booked {}.", service.service_name);
        }
        BookingsCommand::Mine => {
            let Some(user) = signed_in(app, "/my-bookings") else {
                return Ok(());
            };
            for booking in &app.api.user_bookings(&user.email).await? {
                println!("{}", render::booking_line(booking));
            }
        }
        BookingsCommand::Provider => {
            let Some(user) = signed_in(app, "/service-to-do") else {
                return Ok(());
            };
            for booking in &app.api.provider_bookings(&user.email).await? {
                println!("{}", render::booking_line(booking));
            }
        }
        BookingsCommand::Cancel { id } => {
            if signed_in(app, "/my-bookings").is_none() {
                return Ok(());
            }
            app.api.cancel_booking(&id).await?;
            println!("Booking cancelled.");
        }
        BookingsCommand::Status { id, status } => {
            let Some(user) = signed_in(app, "/service-to-do") else {
                return Ok(());
            };
            let received = app.api.provider_bookings(&user.email).await?;
            let booking = received
                .iter()
                .find(|b| b.id == id)
                .ok_or_else(|| anyhow::anyhow!("Booking {} is not one of yours", id))?;
            if !booking.status().can_transition_to(status) {
                anyhow::bail!("Cannot mark a {} booking as {}", booking.status(), status);
            }
            app.api.update_booking_status(&id, status).await?;
            println!("Booking marked {}.", status);
        }
    }
    Ok(())
}

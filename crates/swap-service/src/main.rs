use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use swap_config::{Config, ConfigLoader};
use swap_core::{is_high_price_impact, SubmitOutcome};
use swap_quote::QuoteView;
use swap_types::{
	parse_amount, usd_slippage, Decimal, OrderStatus, RoundingStrategy, StringRfqOrder, Token,
};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod reporting;
mod wiring;

use wiring::Services;

#[derive(Parser)]
#[command(name = "swap-cli")]
#[command(about = "Token swap quoting and order execution", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, env = "SWAP_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Validate the configuration file and build every implementation
	Validate,
	/// Quote a pair, once or continuously
	Quote {
		#[arg(long)]
		from: String,
		#[arg(long)]
		to: String,
		/// Amount of the source token; the unit rate is shown when omitted
		#[arg(long, default_value = "")]
		amount: String,
		/// Keep quoting on the configured interval until interrupted
		#[arg(long)]
		watch: bool,
	},
	/// Execute a market trade
	Trade {
		#[arg(long)]
		from: String,
		#[arg(long)]
		to: String,
		#[arg(long)]
		amount: String,
	},
	/// Place an RFQ limit order
	Limit {
		#[arg(long)]
		from: String,
		#[arg(long)]
		to: String,
		/// Amount of the source token offered
		#[arg(long)]
		amount: Decimal,
		/// Amount of the destination token asked for
		#[arg(long)]
		receive: Decimal,
		/// Order lifetime; defaults to the configured duration
		#[arg(long)]
		duration_secs: Option<u64>,
	},
	/// List open limit orders of the wallet account
	Orders,
	/// List configured tokens with the wallet's balances
	Tokens {
		/// List the tokens the order book accepts instead
		#[arg(long)]
		book: bool,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	let config = load_config(&cli.config).await?;
	match cli.command {
		Commands::Validate => validate(config),
		Commands::Quote {
			from,
			to,
			amount,
			watch,
		} => quote(Services::build(config)?, &from, &to, &amount, watch).await,
		Commands::Trade { from, to, amount } => {
			trade(Services::build(config)?, &from, &to, &amount).await
		}
		Commands::Limit {
			from,
			to,
			amount,
			receive,
			duration_secs,
		} => {
			limit(
				Services::build(config)?,
				&from,
				&to,
				amount,
				receive,
				duration_secs,
			)
			.await
		}
		Commands::Orders => orders(Services::build(config)?).await,
		Commands::Tokens { book: false } => tokens(Services::build(config)?).await,
		Commands::Tokens { book: true } => book_tokens(Services::build(config)?).await,
	}
}

async fn load_config(path: &Path) -> Result<Config> {
	info!("Loading configuration from: {:?}", path);
	ConfigLoader::new()
		.with_file(path)
		.load()
		.await
		.context("Failed to load configuration")
}

fn validate(config: Config) -> Result<()> {
	info!("Configuration is valid");
	info!("Name: {}", config.app.name);
	info!("Chain: {}", config.network.chain_id);
	info!("Wallet: {}", config.wallet.implementation);
	info!("Market: {}", config.market.implementation);
	info!("Order book: {}", config.order_book.implementation);
	info!("Storage: {}", config.storage.implementation);
	info!("Tokens: {}", config.tokens.len());

	Services::build(config).context("Implementation settings are invalid")?;
	info!("All implementations built");
	Ok(())
}

fn usd(amount: Decimal) -> String {
	format!(
		"${:.2}",
		amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
	)
}

fn print_quote(from: &Token, to: &Token, amount: &str, view: &QuoteView) {
	if let Some(text) = describe_quote(from, to, amount, view) {
		println!("{}", text);
	}
}

fn describe_quote(from: &Token, to: &Token, amount: &str, view: &QuoteView) -> Option<String> {
	if let Some(error) = &view.error {
		return Some(format!("{} -> {}: quote failed: {}", from.symbol, to.symbol, error));
	}
	let quote = view.quote.as_ref()?;
	if !quote.has_route() {
		return Some(format!("{} -> {}: no route", from.symbol, to.symbol));
	}

	let received = quote
		.output_amount_usd
		.map(|value| format!(" ({})", usd(value)))
		.unwrap_or_default();
	let paid_usd = parse_amount(amount)
		.ok()
		.flatten()
		.zip(from.usd_price)
		.and_then(|(amount, price)| amount.checked_mul(price));
	let slippage = usd_slippage(paid_usd, quote.output_amount_usd)
		.map(|percent| format!(" | USD difference {}%", percent))
		.unwrap_or_default();
	let marker = if is_high_price_impact(quote.price_impact) {
		" (high)"
	} else {
		""
	};

	Some(format!(
		"1 {} = {} {} | 1 {} = {} {}\nreceive {} {}{} | price impact {}%{}{}",
		from.symbol,
		quote.display_rate(false),
		to.symbol,
		to.symbol,
		quote.display_rate(true),
		from.symbol,
		quote.output_amount,
		to.symbol,
		received,
		quote.price_impact,
		marker,
		slippage
	))
}

async fn quote(services: Services, from: &str, to: &str, amount: &str, watch: bool) -> Result<()> {
	let (from, to) = (services.token(from).await?, services.token(to).await?);
	let session = services.session(from.clone(), to.clone());
	session.apply_amount(amount);

	if !watch {
		session.refresh().await;
		print_quote(&from, &to, amount, &session.quote_view());
		return Ok(());
	}

	let mut updates = session.subscribe_quotes();
	let runner = tokio::spawn(session.clone().run());
	loop {
		tokio::select! {
			changed = updates.changed() => {
				if changed.is_err() {
					break;
				}
				let view = updates.borrow_and_update().clone();
				if !view.is_loading() {
					print_quote(&from, &to, amount, &view);
				}
			}
			_ = signal::ctrl_c() => {
				info!("Interrupted");
				break;
			}
		}
	}

	session.shutdown();
	runner.await.context("Quote loop failed")?;
	Ok(())
}

async fn trade(services: Services, from: &str, to: &str, amount: &str) -> Result<()> {
	let (from, to) = (services.token(from).await?, services.token(to).await?);
	let session = services.session(from.clone(), to.clone());
	session.apply_amount(amount);
	session.refresh().await;
	print_quote(&from, &to, amount, &session.quote_view());

	let executor = services.executor();
	let connected = services.wallet.snapshot().await?.is_connected();
	let button = session
		.trade_button(connected, executor.view().state.is_busy())
		.await;
	if button.disabled {
		bail!("Cannot trade: {}", button.label);
	}
	let Some(submission) = session.submission(services.config.app.slippage_tolerance, false) else {
		bail!("No quote available for {} {}", amount, from.symbol);
	};

	match executor.submit(submission).await? {
		SubmitOutcome::Settled(hash) => println!("Trade settled in {}", hash.short()),
		SubmitOutcome::ConnectRequested => println!("Connect a wallet to trade"),
		SubmitOutcome::Rejected => println!("Trade rejected"),
		SubmitOutcome::Failed(error) => bail!("Trade failed: {}", error),
	}
	Ok(())
}

async fn limit(
	services: Services,
	from: &str,
	to: &str,
	amount: Decimal,
	receive: Decimal,
	duration_secs: Option<u64>,
) -> Result<()> {
	let (from, to) = (services.token(from).await?, services.token(to).await?);
	let user = services
		.wallet
		.account()
		.await
		.context("A signing wallet is required for limit orders")?;
	let duration =
		Duration::from_secs(duration_secs.unwrap_or(services.config.app.limit_duration_secs));

	let response = services
		.limit_orders()
		.await?
		.submit_limit_order(
			&from,
			&to,
			from.to_raw(amount)?,
			to.to_raw(receive)?,
			user,
			duration,
		)
		.await?;
	println!("{}", response.message);
	Ok(())
}

async fn orders(services: Services) -> Result<()> {
	let maker = services
		.wallet
		.account()
		.await
		.context("A wallet account is required to list orders")?;
	let response = services.book.orders(maker).await?;

	let open: Vec<_> = response
		.orders
		.iter()
		.filter(|o| o.meta_data.status == OrderStatus::Fillable)
		.collect();
	println!("{} open of {} orders", open.len(), response.orders.len());
	for element in open {
		let order = StringRfqOrder::from(&element.order);
		println!(
			"{} | {} {} -> {} {} | remaining {} | expires {}",
			element.meta_data.order_hash,
			order.maker_amount,
			order.maker_token,
			order.taker_amount,
			order.taker_token,
			element.meta_data.remaining_fillable_amount,
			order.expiry
		);
	}
	Ok(())
}

async fn tokens(services: Services) -> Result<()> {
	let account = services.wallet.snapshot().await?.account;
	let native_token = services.config.network.native_token;

	for token in services.store.all().await {
		let balance = match account {
			Some(owner) => {
				let native = token.address == native_token;
				let raw = services.wallet.balance(token.address, owner, native).await?;
				token.from_raw(raw)?.to_string()
			}
			None => "-".to_string(),
		};
		println!("{:<8} {} {}", token.symbol, token.address, balance);
	}
	Ok(())
}

async fn book_tokens(services: Services) -> Result<()> {
	let list = services
		.book
		.token_list()
		.await
		.context("Failed to fetch the order book token list")?
		.result;
	println!(
		"{} v{}.{}.{}",
		list.name, list.version.major, list.version.minor, list.version.patch
	);
	for token in list.tokens {
		println!(
			"{:<8} {} chain {} decimals {}",
			token.symbol, token.address, token.chain_id, token.decimals
		);
	}
	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

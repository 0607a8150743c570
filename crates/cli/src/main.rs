use anyhow::Context;

use libris_auth::{AuthenticationProvider, Credentials, Principal, Role, StaticAuthenticationProvider};
use libris_catalog::ItemQuery;
use libris_core::Money;
use libris_ledger::AccountProfile;
use libris_lending::{LendingConfig, LendingService};

use libris_cli::delivery::LinkDelivery;
use libris_cli::seed::seed_classics;

fn main() -> anyhow::Result<()> {
    libris_observability::init();

    let config = LendingConfig::from_env().context("invalid lending configuration")?;
    let service = LendingService::new(config);
    let audit = service.subscribe();

    // Accounts and logins.
    let logins = StaticAuthenticationProvider::new();
    let admin_id = service.open_account(Role::Administrator, Money::ZERO)?;
    logins.register(Credentials::new("admin@libris.local", "admin"), Principal::administrator(admin_id))?;
    let reader_id = service.sign_up(Role::Member, AccountProfile::new("Reader", "reader@libris.local"))?;
    logins.register(Credentials::new("reader@libris.local", "reader"), Principal::member(reader_id))?;

    let admin = logins.authenticate(&Credentials::new("admin@libris.local", "admin"))?;
    let ids = seed_classics(&service, &admin)?;

    let reader = logins.authenticate(&Credentials::new("reader@libris.local", "reader"))?;
    service.deposit(reader.account_id, Money::from_cents(5_000))?;

    let fiction: Vec<String> = service
        .find(ItemQuery::all().category("Fiction"))
        .map(|item| item.metadata.title)
        .collect();
    tracing::info!(?fiction, categories = ?service.categories(), "browsing");

    let gatsby = *ids.first().context("seed catalog is empty")?;
    let quote = service.quote(gatsby, 7)?;
    let receipt = service.borrow(gatsby, reader.account_id, 7)?;
    tracing::info!(%quote, price = %receipt.price, balance = %receipt.balance_after, due_at = %receipt.due_at, "borrowed");

    let link = service.open_content(gatsby, reader.account_id, &LinkDelivery::new("https://cdn.libris.local"))?;
    tracing::info!(%link, "content opened");

    // Members never reach admin operations.
    if let Err(err) = service.stats(&reader) {
        tracing::info!(kind = err.kind(), "stats refused for member");
    }
    let stats = service.stats(&admin)?;
    tracing::info!(?stats, "catalog stats");

    service.return_item(gatsby, reader.account_id)?;
    if let Err(err) = service.return_item(gatsby, reader.account_id) {
        tracing::info!(kind = err.kind(), "second return rejected");
    }

    let events = audit.drain();
    tracing::info!(count = events.len(), "audit events recorded");

    let snapshot = service.snapshot().to_json().context("snapshot export failed")?;
    println!("{snapshot}");
    Ok(())
}

use chrono::NaiveDate;

use libris_auth::Principal;
use libris_catalog::ItemSpec;
use libris_core::{ItemId, LendingResult, Money};
use libris_lending::LendingService;

struct SeedTitle {
    title: &'static str,
    author: &'static str,
    isbn: &'static str,
    category: &'static str,
    published: (i32, u32, u32),
    description: &'static str,
    content_ref: &'static str,
    copies: u32,
    price_cents: i64,
}

const CLASSICS: [SeedTitle; 5] = [
    SeedTitle {
        title: "The Great Gatsby",
        author: "F. Scott Fitzgerald",
        isbn: "978-0743273565",
        category: "Fiction",
        published: (1925, 4, 10),
        description: "The story of the mysteriously wealthy Jay Gatsby and his love for the beautiful Daisy Buchanan.",
        content_ref: "/books/great-gatsby.pdf",
        copies: 3,
        price_cents: 999,
    },
    SeedTitle {
        title: "To Kill a Mockingbird",
        author: "Harper Lee",
        isbn: "978-0446310789",
        category: "Fiction",
        published: (1960, 7, 11),
        description: "The story of racial injustice and the loss of innocence in the American South.",
        content_ref: "/books/to-kill-a-mockingbird.pdf",
        copies: 2,
        price_cents: 1299,
    },
    SeedTitle {
        title: "Pride and Prejudice",
        author: "Jane Austen",
        isbn: "978-0141439518",
        category: "Romance",
        published: (1813, 1, 28),
        description: "A romantic novel of manners that follows the character development of Elizabeth Bennet.",
        content_ref: "/books/pride-and-prejudice.pdf",
        copies: 4,
        price_cents: 899,
    },
    SeedTitle {
        title: "1984",
        author: "George Orwell",
        isbn: "978-0451524935",
        category: "Science Fiction",
        published: (1949, 6, 8),
        description: "A dystopian social science fiction novel that follows the life of Winston Smith.",
        content_ref: "/books/1984.pdf",
        copies: 3,
        price_cents: 1199,
    },
    SeedTitle {
        title: "The Hobbit",
        author: "J.R.R. Tolkien",
        isbn: "978-0547928227",
        category: "Fantasy",
        published: (1937, 9, 21),
        description: "A fantasy novel about the adventures of Bilbo Baggins.",
        content_ref: "/books/the-hobbit.pdf",
        copies: 5,
        price_cents: 1499,
    },
];

fn spec(seed: &SeedTitle) -> ItemSpec {
    let spec = ItemSpec::new(seed.title, seed.author, Money::from_cents(seed.price_cents), seed.copies)
        .with_isbn(seed.isbn)
        .with_category(seed.category)
        .with_description(seed.description)
        .with_content_ref(seed.content_ref);
    let (y, m, d) = seed.published;
    match NaiveDate::from_ymd_opt(y, m, d) {
        Some(date) => spec.with_published(date),
        None => spec,
    }
}

/// Add the starter catalog, returning ids in seed order.
pub fn seed_classics(service: &LendingService, admin: &Principal) -> LendingResult<Vec<ItemId>> {
    let ids = CLASSICS
        .iter()
        .map(|seed| service.add_item(admin, spec(seed)))
        .collect::<LendingResult<Vec<_>>>()?;
    tracing::info!(titles = ids.len(), "catalog seeded");
    Ok(ids)
}

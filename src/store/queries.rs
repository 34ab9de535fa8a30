/// Auction row lookup
pub const GET_AUCTION: &str = r#"
    SELECT id, seller_id, title, description, category_id, condition_id, tags,
           start_price, current_price, start_time, end_time, status, created_at
    FROM auctions
    WHERE id = $1
"#;

/// Bids for one auction, acceptance order
pub const GET_AUCTION_BIDS: &str = r#"
    SELECT id, auction_id, bidder_id, amount, placed_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY placed_at ASC, id ASC
"#;

/// Bidder balance lookup
pub const GET_BIDDER_BALANCE: &str = "SELECT balance FROM bidders WHERE id = $1";

/// Compare-and-commit price/end-time update. Matches zero rows when the
/// price moved, the auction ended, or it is outside its bidding window.
/// The row lock serializes concurrent commits on the same auction.
pub const COMMIT_AUCTION_PRICE: &str = r#"
    UPDATE auctions
    SET current_price = $2, end_time = $3, status = 'ACTIVE'
    WHERE id = $1
      AND current_price = $4
      AND status <> 'ENDED'
      AND start_time <= $5
      AND end_time > $5
    RETURNING id
"#;

/// Commit-failure diagnosis
pub const GET_AUCTION_PRICE_STATUS: &str =
    "SELECT current_price, status, start_time, end_time FROM auctions WHERE id = $1";

/// Escrow debit, guarded so a balance never goes negative
pub const DEBIT_BIDDER_BALANCE: &str = r#"
    UPDATE bidders
    SET balance = balance - $2
    WHERE id = $1 AND balance >= $2
    RETURNING balance
"#;

/// Escrow refund for a superseded bidder
pub const CREDIT_BIDDER_BALANCE: &str =
    "UPDATE bidders SET balance = balance + $2 WHERE id = $1";

/// Bidder existence check (distinguishes unknown bidder from empty purse)
pub const BIDDER_EXISTS: &str = "SELECT id FROM bidders WHERE id = $1";

/// Highest accepted bid for one auction
pub const GET_HIGHEST_BID: &str = r#"
    SELECT id, auction_id, bidder_id, amount, placed_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC
    LIMIT 1
"#;

/// Accepted bid insert
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_id, amount, placed_at)
    VALUES ($1, $2, $3, $4)
"#;

/// New auction insert
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (seller_id, title, description, category_id, condition_id, tags,
                          start_price, current_price, start_time, end_time, status, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
    RETURNING id
"#;

/// Conclusion update, idempotent
pub const CONCLUDE_AUCTION: &str = "UPDATE auctions SET status = 'ENDED' WHERE id = $1";

/// Filtered listing query. Empty filter arrays match everything; tag
/// matching uses array overlap.
pub const LIST_AUCTIONS: &str = r#"
    SELECT id, seller_id, title, description, category_id, condition_id, tags,
           start_price, current_price, start_time, end_time, status, created_at
    FROM auctions
    WHERE (cardinality($1::bigint[]) = 0 OR category_id = ANY($1))
      AND (cardinality($2::bigint[]) = 0 OR condition_id = ANY($2))
      AND (cardinality($3::text[]) = 0 OR tags && $3)
      AND ($4 = '' OR title ILIKE '%' || $4 || '%')
    ORDER BY created_at DESC
"#;

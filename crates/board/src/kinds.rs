use shared::domain::{Order, OrderId, OrderStatus, Quote, QuoteId, QuoteStatus};

use crate::item::{BoardItem, StatusKey};

impl StatusKey for OrderStatus {
    const ALL: &'static [Self] = OrderStatus::ALL;
}

impl StatusKey for QuoteStatus {
    const ALL: &'static [Self] = QuoteStatus::ALL;
}

impl BoardItem for Order {
    type Id = OrderId;
    type Status = OrderStatus;

    fn id(&self) -> &OrderId {
        &self.id
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }
}

impl BoardItem for Quote {
    type Id = QuoteId;
    type Status = QuoteStatus;

    fn id(&self) -> &QuoteId {
        &self.id
    }

    fn status(&self) -> QuoteStatus {
        self.status
    }

    fn set_status(&mut self, status: QuoteStatus) {
        self.status = status;
    }
}

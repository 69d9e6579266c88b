#[derive(Clone, wealthform::form::FormModel)]
struct AllocationForm<T> {
    weight: T,
}

fn main() {
    let _ = AllocationForm { weight: 1_u8 }.weight;
}

use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CreateCustomer, Customer, CustomerModel, CustomerService, EmailAddress, FindAllCustomers,
    UpdateCustomer,
};
use repository::{CancellationToken, InMemoryRepository};

fn bench_create_aggregate(c: &mut Criterion) {
    c.bench_function("domain/customer_create", |b| {
        b.iter(|| Customer::create("John", "Doe", "john.doe@example.com").unwrap());
    });

    c.bench_function("domain/email_parse", |b| {
        b.iter(|| EmailAddress::create("  John.Doe@Example.com ").unwrap());
    });
}

fn bench_mutators(c: &mut Criterion) {
    let customer = Customer::create("John", "Doe", "john.doe@example.com").unwrap();

    c.bench_function("domain/change_name_and_email", |b| {
        b.iter(|| {
            let mut customer = customer.clone();
            customer
                .change_name("Johnny", "Doe")
                .unwrap()
                .change_email("johnny@example.com")
                .unwrap();
        });
    });
}

fn bench_service_create(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("domain/service_create", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = CustomerService::new(InMemoryRepository::<Customer>::new());
                let cmd = CreateCustomer::new(CustomerModel::new(
                    "John",
                    "Doe",
                    "john.doe@example.com",
                ));
                service.create(cmd, &CancellationToken::new()).await.unwrap();
            });
        });
    });
}

fn bench_service_update(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CustomerService::new(InMemoryRepository::<Customer>::new());
    let cancel = CancellationToken::new();
    let mut current = rt.block_on(async {
        let cmd = CreateCustomer::new(CustomerModel::new("John", "Doe", "john.doe@example.com"));
        service.create(cmd, &cancel).await.unwrap()
    });

    c.bench_function("domain/service_update", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut model = current.clone();
                model.first_name = if model.first_name == "John" {
                    "Johnny".to_string()
                } else {
                    "John".to_string()
                };
                let id = model.id.clone().unwrap();
                current = service
                    .update(UpdateCustomer::new(id, model), &cancel)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_find_all(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CustomerService::new(InMemoryRepository::<Customer>::new());
    let cancel = CancellationToken::new();
    rt.block_on(async {
        for i in 0..500 {
            let cmd = CreateCustomer::new(CustomerModel::new(
                "Customer",
                &format!("Number{i:03}"),
                &format!("customer{i}@example.com"),
            ));
            service.create(cmd, &cancel).await.unwrap();
        }
    });

    c.bench_function("domain/find_all_500_ordered_page", |b| {
        b.iter(|| {
            rt.block_on(async {
                let query = FindAllCustomers {
                    order_by: Some("last_name".to_string()),
                    descending: true,
                    skip: Some(100),
                    take: Some(50),
                    ..FindAllCustomers::default()
                };
                service.find_all(query, &cancel).await.unwrap()
            })
        });
    });
}

criterion_group!(
    benches,
    bench_create_aggregate,
    bench_mutators,
    bench_service_create,
    bench_service_update,
    bench_find_all,
);
criterion_main!(benches);

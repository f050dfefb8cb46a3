use anyhow::Result;

use flintfs::{EntryKind, Fs, FsConfig, FsError, MemDevice};

#[test]
fn mkdir_chain_and_list() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 32);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg)?;

    // Вся цепочка создаётся одним вызовом.
    fs.mkdir("/x/y/z")?;

    assert_eq!(
        fs.list("/x")?,
        vec![("y".to_string(), EntryKind::Dictionary)]
    );
    assert_eq!(
        fs.list("/x/y")?,
        vec![("z".to_string(), EntryKind::Dictionary)]
    );
    assert!(fs.list("/x/y/z")?.is_empty());

    // Повторный mkdir существующего пути — успех без изменений.
    fs.mkdir("/x/y")?;
    assert_eq!(fs.list("/x")?.len(), 1);

    Ok(())
}

#[test]
fn values_inside_directories() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 32);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg)?;

    fs.mkdir("/etc/app")?;
    fs.set("/etc/app/conf", b"k=v")?;
    fs.set("/etc/app/data", b"12345")?;

    assert_eq!(fs.get("/etc/app/conf")?, b"k=v");

    let mut names = fs.list("/etc/app")?;
    names.sort();
    assert_eq!(
        names,
        vec![
            ("conf".to_string(), EntryKind::Value),
            ("data".to_string(), EntryKind::Value),
        ]
    );

    // Каталог и значение различимы в листинге родителя.
    assert_eq!(
        fs.list("/etc")?,
        vec![("app".to_string(), EntryKind::Dictionary)]
    );

    // Удаление значения не трогает соседей.
    fs.delete("/etc/app/conf")?;
    assert!(matches!(fs.get("/etc/app/conf"), Err(FsError::NotFound(_))));
    assert_eq!(fs.get("/etc/app/data")?, b"12345");

    Ok(())
}

#[test]
fn mkdir_over_value_is_rejected() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 32);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg)?;

    fs.set("/v", b"x")?;
    assert!(matches!(
        fs.mkdir("/v/sub"),
        Err(FsError::DictionaryExpected(_))
    ));
    assert!(matches!(fs.mkdir("/v"), Err(FsError::DictionaryExpected(_))));
    Ok(())
}

#[test]
fn missing_parent_is_not_found() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 32);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg)?;

    assert!(matches!(fs.get("/no/such"), Err(FsError::NotFound(_))));
    assert!(matches!(
        fs.set("/no/such", b"x"),
        Err(FsError::NotFound(_))
    ));
    assert!(matches!(fs.list("/no"), Err(FsError::NotFound(_))));
    Ok(())
}

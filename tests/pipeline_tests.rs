//! End-to-end runs over fixture trees laid out like a VMware host.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::{tempdir, TempDir};

use vmfixed::config::{HostLayout, Settings, VmSource};
use vmfixed::ip::AllocationError;
use vmfixed::orchestrator::generate_fixed_addresses;
use vmfixed::output::{render_json, render_text};

const NETWORKING: &str = "VERSION=1,0
answer VNET_1_DHCP yes
answer VNET_1_HOSTONLY_NETMASK 255.255.255.0
answer VNET_1_HOSTONLY_SUBNET 172.16.33.0
answer VNET_1_VIRTUAL_ADAPTER yes
answer VNET_8_DHCP yes
answer VNET_8_HOSTONLY_NETMASK 255.255.255.0
answer VNET_8_HOSTONLY_SUBNET 192.168.194.0
answer VNET_8_NAT yes
answer VNET_8_VIRTUAL_ADAPTER yes
answer VNET_2_DHCP no
";

const VMNET8_DHCPD: &str = "# Configuration file for ISC 2.0 vmnet-dhcpd operating on vmnet8.
allow unknown-clients;
default-lease-time 1800;                # default is 30 minutes
max-lease-time 7200;                    # default is 2 hours

subnet 192.168.194.0 netmask 255.255.255.0 {
\trange 192.168.194.128 192.168.194.254;
\toption broadcast-address 192.168.194.255;
\toption domain-name-servers 192.168.194.2;
\toption domain-name localdomain;
\tdefault-lease-time 1800;
\tmax-lease-time 7200;
\toption netbios-name-servers 192.168.194.2;
\toption routers 192.168.194.2;
}
host vmnet8 {
\thardware ethernet 00:50:56:C0:00:08;
\tfixed-address 192.168.194.1;
\toption domain-name-servers 0.0.0.0;
\toption domain-name \"\";
\toption routers 0.0.0.0;
}
";

const VMNET1_DHCPD: &str = "subnet 172.16.33.0 netmask 255.255.255.0 {
\trange 172.16.33.128 172.16.33.254;
\toption broadcast-address 172.16.33.255;
\toption domain-name-servers 172.16.33.1;
\toption domain-name \"hostonly.test\";
}
";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self { dir: tempdir().unwrap() };
        fixture.write("prefs/networking", NETWORKING);
        fixture.write("prefs/vmnet8/dhcpd.conf", VMNET8_DHCPD);
        fixture.write("prefs/vmnet1/dhcpd.conf", VMNET1_DHCPD);
        fs::create_dir_all(fixture.root().join("vms")).unwrap();
        fixture
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn add_vm(&self, bundle: &str, content: &str) {
        self.write(&format!("vms/{0}.vmwarevm/{0}.vmx", bundle), content);
    }

    fn settings(&self) -> Settings {
        Settings {
            prefs_dir: self.root().join("prefs"),
            vms: VmSource::Discover(self.root().join("vms")),
            layout: HostLayout::Fusion,
            default_domain: "localdomain".to_string(),
        }
    }
}

fn nat_vmx(name: &str, mac: &str) -> String {
    format!(
        ".encoding = \"UTF-8\"\ndisplayName = \"{}\"\nethernet0.present = \"TRUE\"\nethernet0.connectionType = \"nat\"\nethernet0.generatedAddress = \"{}\"\n",
        name, mac
    )
}

fn timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

#[test]
fn test_full_run_text_output() {
    let fixture = Fixture::new();
    fixture.add_vm("zeta", &nat_vmx("beta", "00:0C:29:00:00:02"));
    fixture.add_vm("alpha", &nat_vmx("alpha", "00:0C:29:00:00:01"));
    fixture.add_vm(
        "multi",
        concat!(
            "displayName = \"gamma\"\n",
            "ethernet0.connectionType = \"hostonly\"\n",
            "ethernet0.generatedAddress = \"00:0C:29:00:00:03\"\n",
            "ethernet1.connectionType = \"nat\"\n",
            "ethernet1.generatedAddress = \"00:0C:29:00:00:04\"\n",
            "ethernet2.connectionType = \"bridged\"\n",
            "ethernet2.generatedAddress = \"00:0C:29:00:00:05\"\n",
        ),
    );

    let groups = generate_fixed_addresses(&fixture.settings()).unwrap();
    let text = render_text(&groups, timestamp());

    let expected = "\
## 2024-01-15T10:30:00 vmnet1 fixed-address configs ##

# gamma conn=hostonly dev=ethernet0 net=vmnet1
host gamma {
    hardware ethernet 00:0c:29:00:00:03;
    fixed-address 172.16.33.64;
}

## 2024-01-15T10:30:00 vmnet8 fixed-address configs ##

# alpha conn=nat dev=ethernet0 net=vmnet8
host alpha {
    hardware ethernet 00:0c:29:00:00:01;
    fixed-address 192.168.194.64;
}

# beta conn=nat dev=ethernet0 net=vmnet8
host beta {
    hardware ethernet 00:0c:29:00:00:02;
    fixed-address 192.168.194.65;
}

# gamma conn=nat dev=ethernet1 net=vmnet8
host gamma {
    hardware ethernet 00:0c:29:00:00:04;
    fixed-address 192.168.194.66;
}

";
    assert_eq!(text, expected);
}

#[test]
fn test_pools_and_domains() {
    let fixture = Fixture::new();
    fixture.add_vm("alpha", &nat_vmx("alpha", "00:0C:29:00:00:01"));
    fixture.add_vm(
        "host-only",
        "displayName = \"ho\"\nethernet0.connectionType = \"hostonly\"\nethernet0.generatedAddress = \"00:0C:29:00:00:07\"\n",
    );

    let groups = generate_fixed_addresses(&fixture.settings()).unwrap();
    assert_eq!(groups.len(), 2);

    assert_eq!(groups[0].network, "vmnet1");
    assert_eq!(groups[0].subnet, Some("172.16.33.64/26".parse().unwrap()));
    assert_eq!(groups[0].domain, "hostonly.test");

    assert_eq!(groups[1].network, "vmnet8");
    assert_eq!(groups[1].subnet, Some("192.168.194.64/26".parse().unwrap()));
    assert_eq!(groups[1].domain, "localdomain");
}

#[test]
fn test_output_is_repeatable() {
    let fixture = Fixture::new();
    for i in 0..6 {
        fixture.add_vm(&format!("vm{}", i), &nat_vmx(&format!("guest-{}", i), &format!("00:0C:29:00:01:0{}", i)));
    }

    let first = render_text(&generate_fixed_addresses(&fixture.settings()).unwrap(), timestamp());
    let second = render_text(&generate_fixed_addresses(&fixture.settings()).unwrap(), timestamp());
    assert_eq!(first, second);
    assert!(first.contains("fixed-address 192.168.194.69;"));
}

#[test]
fn test_adding_vm_shifts_later_addresses() {
    let fixture = Fixture::new();
    fixture.add_vm("b", &nat_vmx("bravo", "00:0C:29:00:00:0B"));
    let before = generate_fixed_addresses(&fixture.settings()).unwrap();
    assert_eq!(before[0].records[0].ip.to_string(), "192.168.194.64");

    fixture.add_vm("a", &nat_vmx("alpha", "00:0C:29:00:00:0A"));
    let after = generate_fixed_addresses(&fixture.settings()).unwrap();
    assert_eq!(after[0].records[0].host, "alpha");
    assert_eq!(after[0].records[1].host, "bravo");
    assert_eq!(after[0].records[1].ip.to_string(), "192.168.194.65");
}

#[test]
fn test_display_name_fallback_to_file_name() {
    let fixture = Fixture::new();
    fixture.add_vm(
        "nameless",
        "ethernet0.connectionType = \"nat\"\nethernet0.generatedAddress = \"00:0C:29:00:00:0F\"\n",
    );

    let groups = generate_fixed_addresses(&fixture.settings()).unwrap();
    assert_eq!(groups[0].records[0].host, "nameless");
}

#[test]
fn test_network_mismatch_is_not_fatal() {
    let fixture = Fixture::new();
    fixture.write(
        "prefs/networking",
        &NETWORKING.replace("VNET_8_HOSTONLY_SUBNET 192.168.194.0", "VNET_8_HOSTONLY_SUBNET 192.168.200.0"),
    );
    fixture.add_vm("alpha", &nat_vmx("alpha", "00:0C:29:00:00:01"));

    let groups = generate_fixed_addresses(&fixture.settings()).unwrap();
    // The dhcpd config stays authoritative
    assert_eq!(groups[0].records[0].ip.to_string(), "192.168.194.64");
}

#[test]
fn test_dhcp_disabled_network_is_skipped() {
    let fixture = Fixture::new();
    // vmnet2 has DHCP disabled and no dhcpd.conf; it must not be read
    let groups = generate_fixed_addresses(&fixture.settings()).unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_missing_lease_config_is_fatal() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.root().join("prefs/vmnet1/dhcpd.conf")).unwrap();

    let report = generate_fixed_addresses(&fixture.settings()).unwrap_err();
    assert!(report.to_string().contains("dhcpd.conf"));
    assert!(report.downcast_ref::<AllocationError>().is_none());
}

#[test]
fn test_missing_networking_file_is_fatal() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.root().join("prefs/networking")).unwrap();
    assert!(generate_fixed_addresses(&fixture.settings()).is_err());
}

#[test]
fn test_pool_exhaustion_is_reported() {
    let fixture = Fixture::new();
    // Reserve everything except 192.168.194.64/30
    fixture.write(
        "prefs/vmnet8/dhcpd.conf",
        "subnet 192.168.194.0 netmask 255.255.255.0 {\n  range 192.168.194.0 192.168.194.63;\n  range 192.168.194.68 192.168.194.255;\n}\n",
    );
    for i in 0..5 {
        fixture.add_vm(&format!("vm{}", i), &nat_vmx(&format!("guest-{}", i), &format!("00:0C:29:00:02:0{}", i)));
    }

    let report = generate_fixed_addresses(&fixture.settings()).unwrap_err();
    assert!(matches!(
        report.downcast_ref::<AllocationError>(),
        Some(AllocationError::PoolExhausted { capacity: 4, .. })
    ));
}

#[test]
fn test_fully_reserved_network_is_reported() {
    let fixture = Fixture::new();
    fixture.write(
        "prefs/vmnet8/dhcpd.conf",
        "subnet 192.168.194.0 netmask 255.255.255.0 {\n  range 192.168.194.0 192.168.194.255;\n}\n",
    );
    fixture.add_vm("alpha", &nat_vmx("alpha", "00:0C:29:00:00:01"));

    let report = generate_fixed_addresses(&fixture.settings()).unwrap_err();
    assert!(matches!(
        report.downcast_ref::<AllocationError>(),
        Some(AllocationError::NoFreeSubnet { .. })
    ));
}

#[test]
fn test_explicit_vmx_paths() {
    let fixture = Fixture::new();
    fixture.add_vm("alpha", &nat_vmx("alpha", "00:0C:29:00:00:01"));
    fixture.add_vm("beta", &nat_vmx("beta", "00:0C:29:00:00:02"));

    let mut settings = fixture.settings();
    settings.vms = VmSource::Explicit(vec![fixture.root().join("vms/beta.vmwarevm/beta.vmx")]);

    let groups = generate_fixed_addresses(&settings).unwrap();
    assert_eq!(groups[0].records.len(), 1);
    assert_eq!(groups[0].records[0].host, "beta");
    assert_eq!(groups[0].records[0].ip.to_string(), "192.168.194.64");
}

#[test]
fn test_missing_explicit_vmx_is_fatal() {
    let fixture = Fixture::new();
    let mut settings = fixture.settings();
    settings.vms = VmSource::Explicit(vec![fixture.root().join("vms/ghost.vmx")]);
    assert!(generate_fixed_addresses(&settings).is_err());
}

#[test]
fn test_workstation_layout() {
    let fixture = Fixture::new();
    fs::remove_dir_all(fixture.root().join("prefs/vmnet8")).unwrap();
    fs::remove_dir_all(fixture.root().join("prefs/vmnet1")).unwrap();
    fixture.write("prefs/vmnet8/dhcpd/dhcpd.conf", VMNET8_DHCPD);
    fixture.write("prefs/vmnet1/dhcpd/dhcpd.conf", VMNET1_DHCPD);
    fixture.add_vm("alpha", &nat_vmx("alpha", "00:0C:29:00:00:01"));

    let mut settings = fixture.settings();
    settings.layout = HostLayout::Workstation;

    let groups = generate_fixed_addresses(&settings).unwrap();
    assert_eq!(groups[0].records[0].ip.to_string(), "192.168.194.64");
}

#[test]
fn test_json_output() {
    let fixture = Fixture::new();
    fixture.add_vm("alpha", &nat_vmx("alpha", "00:0C:29:00:00:01"));

    let groups = generate_fixed_addresses(&fixture.settings()).unwrap();
    let json = render_json(&groups, timestamp()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["groups"][0]["network"], "vmnet8");
    assert_eq!(value["groups"][0]["domain"], "localdomain");
    assert_eq!(value["groups"][0]["records"][0]["mac"], "00:0c:29:00:00:01");
    assert_eq!(value["groups"][0]["records"][0]["connection_type"], "nat");
}
